use async_trait::async_trait;
use tracing::{debug, warn};

use resorts_core::{AttachmentDescriptor, AttachmentRecord, Document, DocumentLink};

use crate::error::DocumentError;
use crate::outcome::{AttachmentFailure, AttachmentFailureReason, Listing, Page, Stored};

/// How an attachment record is written to a document's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    /// Fail with [`DocumentError::Conflict`] if the name is already attached.
    Create,
    /// Replace an existing attachment with the same name, or add it.
    Upsert,
}

/// Trait for document storage backends.
///
/// Backends implement the primitive operations; the create/update protocol
/// (document first, then each attachment record in order) and the
/// best-effort paginated drain are provided on top of them.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait DocumentStore<T: Document>: Send + Sync {
    /// Read one page of the collection, starting at `continuation`.
    async fn read_page(&self, continuation: Option<&str>) -> Result<Page<T>, DocumentError>;

    /// Fetch a document by id. Returns `Ok(None)` when the store reports
    /// that the document does not exist.
    async fn get(&self, id: &str) -> Result<Option<T>, DocumentError>;

    /// Persist a new document and return it with its self link populated.
    async fn insert(&self, item: &T) -> Result<T, DocumentError>;

    /// Replace the full body of the document at `id`.
    async fn replace(&self, id: &str, item: &T) -> Result<T, DocumentError>;

    /// Delete a document. Returns `true` if it existed.
    ///
    /// Uploaded binaries referenced by its attachments are left in place.
    async fn delete(&self, id: &str) -> Result<bool, DocumentError>;

    /// Write one attachment record under a document's attachment feed.
    async fn write_attachment(
        &self,
        link: &DocumentLink,
        record: &AttachmentRecord,
        mode: AttachMode,
    ) -> Result<(), DocumentError>;

    /// Enumerate a document's attachment feed, in feed order.
    async fn list_attachments(
        &self,
        link: &DocumentLink,
    ) -> Result<Vec<AttachmentRecord>, DocumentError>;

    /// Drain every page of the collection.
    ///
    /// A failing page stops the drain; documents read so far are returned
    /// together with the error.
    async fn list_all(&self) -> Listing<T> {
        let mut items = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            match self.read_page(continuation.as_deref()).await {
                Ok(page) => {
                    debug!(count = page.items.len(), "read document page");
                    items.extend(page.items);
                    match page.continuation {
                        Some(next) => continuation = Some(next),
                        None => break,
                    }
                }
                Err(e) => {
                    warn!(error = %e, read = items.len(), "document listing stopped early");
                    return Listing {
                        items,
                        interrupted: Some(e),
                    };
                }
            }
        }
        Listing {
            items,
            interrupted: None,
        }
    }

    /// Persist a new document, then create one attachment record per
    /// descriptor.
    ///
    /// Attachments are written only after the store accepts the document,
    /// one at a time. A failed attachment is recorded and the rest are
    /// still attempted; the document is never rolled back.
    async fn create(
        &self,
        item: &T,
        attachments: &[AttachmentDescriptor],
    ) -> Result<Stored<T>, DocumentError> {
        let document = self.insert(item).await?;
        let attachment_failures = self
            .attach_descriptors(&document, attachments, AttachMode::Create)
            .await;
        Ok(Stored {
            document,
            attachment_failures,
        })
    }

    /// Replace the document at `id`, then upsert one attachment record per
    /// descriptor.
    ///
    /// Attachments already on the document but absent from `attachments`
    /// are left untouched.
    async fn update(
        &self,
        id: &str,
        item: &T,
        attachments: &[AttachmentDescriptor],
    ) -> Result<Stored<T>, DocumentError> {
        let document = self.replace(id, item).await?;
        let attachment_failures = self
            .attach_descriptors(&document, attachments, AttachMode::Upsert)
            .await;
        Ok(Stored {
            document,
            attachment_failures,
        })
    }

    /// Enumerate the object store addresses attached to a document, in feed
    /// order.
    async fn list_attachment_addresses(
        &self,
        link: &DocumentLink,
    ) -> Result<Vec<String>, DocumentError> {
        let records = self.list_attachments(link).await?;
        Ok(records.into_iter().map(|record| record.media).collect())
    }

    /// Write each descriptor to the feed of a stored document, collecting
    /// failures instead of stopping.
    async fn attach_descriptors(
        &self,
        document: &T,
        attachments: &[AttachmentDescriptor],
        mode: AttachMode,
    ) -> Vec<AttachmentFailure> {
        let mut failures = Vec::new();
        if attachments.is_empty() {
            return failures;
        }

        let Some(link) = document.link() else {
            warn!(id = %document.id(), "stored document has no self link; skipping attachments");
            return attachments
                .iter()
                .map(|descriptor| AttachmentFailure {
                    name: descriptor.name.clone(),
                    reason: AttachmentFailureReason::Store(DocumentError::Invalid(
                        "stored document has no self link".to_owned(),
                    )),
                })
                .collect();
        };

        for descriptor in attachments {
            let Some(record) = descriptor.to_record() else {
                warn!(id = %link.id, name = %descriptor.name, "attachment has no address; skipped");
                failures.push(AttachmentFailure {
                    name: descriptor.name.clone(),
                    reason: AttachmentFailureReason::MissingAddress,
                });
                continue;
            };

            match self.write_attachment(&link, &record, mode).await {
                Ok(()) => debug!(id = %link.id, name = %record.id, ?mode, "attachment written"),
                Err(e) => {
                    warn!(id = %link.id, name = %record.id, error = %e, "attachment write failed");
                    failures.push(AttachmentFailure {
                        name: descriptor.name.clone(),
                        reason: AttachmentFailureReason::Store(e),
                    });
                }
            }
        }
        failures
    }
}
