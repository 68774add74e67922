use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, instrument, warn};

use resorts_blob::{ObjectStore, download_ordered, upload_ordered};
use resorts_core::{
    AttachmentDescriptor, Document, UploadedFile, descriptor_name, encode_data_url,
    new_document_id,
};
use resorts_document::{
    AttachmentFailure, AttachmentFailureReason, DocumentError, DocumentStore, Listing, Stored,
};

use crate::config::CatalogConfig;
use crate::images::{ImageFailure, ImageSet, Ingested, WithImages};

/// Coordinates a document store and an object store per logical entity.
///
/// Writes go document first, then one attachment record per uploaded
/// binary; reads enumerate the attachment feed and join the binaries back
/// in as `data:` URLs. Nothing is rolled back across the two stores.
pub struct Catalog<T: Document> {
    documents: Arc<dyn DocumentStore<T>>,
    objects: Arc<dyn ObjectStore>,
    config: CatalogConfig,
}

impl<T: Document> Clone for Catalog<T> {
    fn clone(&self) -> Self {
        Self {
            documents: Arc::clone(&self.documents),
            objects: Arc::clone(&self.objects),
            config: self.config.clone(),
        }
    }
}

impl<T: Document> Catalog<T> {
    /// Create a catalog over the given stores.
    pub fn new(
        documents: Arc<dyn DocumentStore<T>>,
        objects: Arc<dyn ObjectStore>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            documents,
            objects,
            config,
        }
    }

    /// The catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// List every document with its images resolved.
    ///
    /// Documents are processed one at a time. Each entry carries its own
    /// image outcome: an unreadable attachment feed is an `Err` for that
    /// document only, and failed downloads are listed in its [`ImageSet`].
    #[instrument(skip(self))]
    pub async fn list_with_images(&self) -> Listing<WithImages<T>> {
        let listing = self.documents.list_all().await;
        let mut items = Vec::with_capacity(listing.items.len());
        for document in listing.items {
            items.push(self.attach_images(document).await);
        }
        debug!(
            count = items.len(),
            complete = listing.interrupted.is_none(),
            degraded = items.iter().filter(|item| !item.is_complete()).count(),
            "listed documents with images"
        );
        Listing {
            items,
            interrupted: listing.interrupted,
        }
    }

    /// Fetch a document by id, without images.
    pub async fn get(&self, id: &str) -> Result<Option<T>, DocumentError> {
        self.documents.get(id).await
    }

    /// Fetch a document by id with its images resolved.
    ///
    /// A failure to read the document is returned as an error; image
    /// failures are reported in the returned [`WithImages`].
    #[instrument(skip(self))]
    pub async fn get_with_images(&self, id: &str) -> Result<Option<WithImages<T>>, DocumentError> {
        let Some(document) = self.documents.get(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.attach_images(document).await))
    }

    async fn attach_images(&self, mut document: T) -> WithImages<T> {
        let images = self.resolve_images(&document).await;
        match &images {
            Ok(set) => document.set_images(set.images.clone()),
            Err(e) => {
                warn!(id = %document.id(), error = %e, "could not read attachment feed");
                document.set_images(Vec::new());
            }
        }
        WithImages { document, images }
    }

    /// Resolve a document's attachment feed into encoded images, in feed
    /// order.
    ///
    /// Each image is labelled with the content type recorded on its
    /// attachment, or the configured fallback when none was recorded. A
    /// document that has not been persisted has no images.
    pub async fn resolve_images(&self, document: &T) -> Result<ImageSet, DocumentError> {
        let Some(link) = document.link() else {
            return Ok(ImageSet::default());
        };
        let records = self.documents.list_attachments(&link).await?;
        let addresses: Vec<String> = records.iter().map(|r| r.media.clone()).collect();
        let payloads =
            download_ordered(self.objects.as_ref(), &addresses, self.config.transfer_concurrency)
                .await;

        let mut set = ImageSet::default();
        for (record, payload) in records.into_iter().zip(payloads) {
            match payload {
                Ok(data) => {
                    let content_type = if record.content_type.is_empty() {
                        self.config.fallback_content_type.as_str()
                    } else {
                        record.content_type.as_str()
                    };
                    set.images.push(encode_data_url(content_type, &data));
                }
                Err(error) => {
                    warn!(id = %link.id, address = %record.media, error = %error, "image download failed");
                    set.failures.push(ImageFailure {
                        address: record.media,
                        error,
                    });
                }
            }
        }
        Ok(set)
    }

    /// Upload each file and build its attachment descriptor, in input order.
    ///
    /// A file whose upload fails yields a descriptor without an address. A
    /// file with an empty filename is not uploaded; it is returned in
    /// [`Ingested::rejected`] instead.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub async fn ingest_uploads(&self, files: Vec<UploadedFile>) -> Ingested {
        let mut named: Vec<(String, String)> = Vec::with_capacity(files.len());
        let mut transfers: Vec<(String, Bytes)> = Vec::with_capacity(files.len());
        let mut rejected = Vec::new();
        for file in files {
            let Some(name) = descriptor_name(&file.filename).map(str::to_owned) else {
                warn!(content_type = %file.content_type, "upload with empty filename rejected");
                rejected.push(AttachmentFailure {
                    name: file.filename,
                    reason: AttachmentFailureReason::InvalidFilename,
                });
                continue;
            };
            named.push((name, file.content_type));
            transfers.push((file.filename, file.data));
        }

        let addresses = upload_ordered(
            self.objects.as_ref(),
            transfers,
            self.config.transfer_concurrency,
        )
        .await;

        let descriptors = named
            .into_iter()
            .zip(addresses)
            .map(|((name, content_type), address)| match address {
                Ok(address) => AttachmentDescriptor::new(name, address, content_type),
                Err(e) => {
                    warn!(name = %name, error = %e, "upload failed");
                    AttachmentDescriptor::unresolved(name, content_type)
                }
            })
            .collect();
        Ingested {
            descriptors,
            rejected,
        }
    }

    /// Create a new entity: assign a fresh id, upload the files, then store
    /// the document and its attachment records.
    #[instrument(skip(self, document, files), fields(files = files.len()))]
    pub async fn create(
        &self,
        mut document: T,
        files: Vec<UploadedFile>,
    ) -> Result<Stored<T>, DocumentError> {
        document.set_id(new_document_id());
        let ingested = self.ingest_uploads(files).await;
        let mut stored = self.documents.create(&document, &ingested.descriptors).await?;
        let attached = ingested
            .descriptors
            .len()
            .saturating_sub(stored.attachment_failures.len());
        prepend_rejected(&mut stored, ingested.rejected);
        info!(
            id = %stored.document.id(),
            attachments = attached,
            failed = stored.attachment_failures.len(),
            "resort created"
        );
        Ok(stored)
    }

    /// Update an entity: upload the files, then replace the document at `id`
    /// and upsert the new attachment records.
    ///
    /// The document's own id is forced to `id`. Attachments not named in
    /// `files` are kept.
    #[instrument(skip(self, document, files), fields(files = files.len()))]
    pub async fn update(
        &self,
        id: &str,
        mut document: T,
        files: Vec<UploadedFile>,
    ) -> Result<Stored<T>, DocumentError> {
        document.set_id(id.to_owned());
        let ingested = self.ingest_uploads(files).await;
        let mut stored = self
            .documents
            .update(id, &document, &ingested.descriptors)
            .await?;
        let attached = ingested
            .descriptors
            .len()
            .saturating_sub(stored.attachment_failures.len());
        prepend_rejected(&mut stored, ingested.rejected);
        info!(
            attachments = attached,
            failed = stored.attachment_failures.len(),
            "resort updated"
        );
        Ok(stored)
    }

    /// Delete the document at `id`. Attachment records and uploaded binaries
    /// are left in place.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<bool, DocumentError> {
        let deleted = self.documents.delete(id).await?;
        if deleted {
            info!("resort deleted");
        }
        Ok(deleted)
    }
}

/// Report files rejected at ingest ahead of the attachment write failures.
fn prepend_rejected<T>(stored: &mut Stored<T>, rejected: Vec<AttachmentFailure>) {
    let written = std::mem::replace(&mut stored.attachment_failures, rejected);
    stored.attachment_failures.extend(written);
}
