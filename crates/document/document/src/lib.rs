pub mod error;
pub mod outcome;
pub mod store;
pub mod testing;

pub use error::DocumentError;
pub use outcome::{AttachmentFailure, AttachmentFailureReason, Listing, Page, Stored};
pub use store::{AttachMode, DocumentStore};
