pub mod files;
pub mod resorts;
