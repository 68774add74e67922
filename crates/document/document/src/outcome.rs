use thiserror::Error;

use crate::error::DocumentError;

/// One page of a paginated document listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Documents on this page.
    pub items: Vec<T>,
    /// Token for the next page, `None` when the listing is exhausted.
    pub continuation: Option<String>,
}

impl<T> Page<T> {
    /// A final page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            continuation: None,
        }
    }
}

/// Result of draining every page of a listing.
///
/// Documents read before a failing page are kept; the failure that stopped
/// the drain is carried in `interrupted`.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    /// Every document read, in store order.
    pub items: Vec<T>,
    /// The error that stopped pagination early, if any.
    pub interrupted: Option<DocumentError>,
}

impl<T> Listing<T> {
    /// Returns `true` if every page was read.
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// Why an attachment could not be written to a document's feed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachmentFailureReason {
    /// The upload had no usable filename, so it was neither stored nor
    /// given a descriptor.
    #[error("upload has an empty filename")]
    InvalidFilename,

    /// The binary upload produced no address, so nothing was attached.
    #[error("upload produced no object store address")]
    MissingAddress,

    /// The document store refused or failed the attachment write.
    #[error(transparent)]
    Store(#[from] DocumentError),
}

/// An attachment that was not written during a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFailure {
    /// Descriptor name of the attachment, or the raw filename when no
    /// descriptor could be derived from it.
    pub name: String,
    /// What went wrong.
    pub reason: AttachmentFailureReason,
}

/// A document accepted by the store, plus any attachment writes that failed
/// afterwards.
#[derive(Debug, Clone)]
pub struct Stored<T> {
    /// The document as returned by the store (self link populated).
    pub document: T,
    /// Attachments that were not written, in descriptor order.
    pub attachment_failures: Vec<AttachmentFailure>,
}

impl<T> Stored<T> {
    /// Returns `true` if every attachment was written.
    pub fn is_complete(&self) -> bool {
        self.attachment_failures.is_empty()
    }
}
