pub mod store;

pub use store::MemoryObjectStore;
