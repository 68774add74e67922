pub mod error;
pub mod fetch;
pub mod store;
pub mod testing;

pub use error::BlobError;
pub use fetch::{download_ordered, upload_ordered};
pub use store::ObjectStore;
