use resorts_blob::BlobError;
use resorts_core::AttachmentDescriptor;
use resorts_document::{AttachmentFailure, DocumentError};

/// An image that could not be resolved from its object store address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    /// Address recorded in the attachment feed.
    pub address: String,
    /// Why the download failed.
    pub error: BlobError,
}

/// Resolved images of one document, as `data:` URLs in attachment feed order.
///
/// Images whose download failed are left out of `images` and listed in
/// `failures`; the remaining images keep their relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    /// Encoded images.
    pub images: Vec<String>,
    /// Downloads that failed.
    pub failures: Vec<ImageFailure>,
}

impl ImageSet {
    /// Returns `true` if every attached image was resolved.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A document returned by an inbound read, with the outcome of resolving its
/// images.
///
/// `images` is `Err` when the attachment feed itself could not be read, so a
/// document with no photos is never confused with one whose photos could not
/// be listed. On success the resolved images are also set on `document`.
#[derive(Debug, Clone)]
pub struct WithImages<T> {
    /// The document as read from the store.
    pub document: T,
    /// Resolved images, or the error that prevented reading the feed.
    pub images: Result<ImageSet, DocumentError>,
}

impl<T> WithImages<T> {
    /// Returns `true` if the feed was read and every image was resolved.
    pub fn is_complete(&self) -> bool {
        self.images.as_ref().is_ok_and(ImageSet::is_complete)
    }

    /// Number of images that could not be resolved, counting an unreadable
    /// feed as one failure.
    pub fn failure_count(&self) -> usize {
        self.images.as_ref().map_or(1, |set| set.failures.len())
    }
}

/// Upload outcome of [`Catalog::ingest_uploads`](crate::Catalog::ingest_uploads).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    /// One descriptor per accepted file, in input order. Descriptors whose
    /// upload failed carry no address.
    pub descriptors: Vec<AttachmentDescriptor>,
    /// Files rejected before upload, in input order.
    pub rejected: Vec<AttachmentFailure>,
}
