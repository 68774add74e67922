use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use resorts_blob::{BlobError, ObjectStore};
use resorts_blob_memory::MemoryObjectStore;
use resorts_catalog::{Catalog, CatalogConfig, ImageSet, WithImages};
use resorts_core::{
    AttachmentDescriptor, AttachmentRecord, Document, DocumentLink, ResortDocument, UploadedFile,
    encode_data_url,
};
use resorts_document::{
    AttachMode, AttachmentFailure, AttachmentFailureReason, DocumentError, DocumentStore, Page,
};
use resorts_document_memory::MemoryDocumentStore;

/// Object store wrapper that fails uploads and downloads for chosen names.
#[derive(Default)]
struct FlakyObjectStore {
    inner: MemoryObjectStore,
    failing_uploads: Mutex<HashSet<String>>,
    failing_downloads: Mutex<HashSet<String>>,
}

impl FlakyObjectStore {
    fn fail_upload(&self, name: &str) {
        self.failing_uploads.lock().unwrap().insert(name.to_owned());
    }

    fn fail_download(&self, address: &str) {
        self.failing_downloads
            .lock()
            .unwrap()
            .insert(address.to_owned());
    }
}

#[async_trait]
impl ObjectStore for FlakyObjectStore {
    async fn upload(&self, name: &str, data: Bytes) -> Result<String, BlobError> {
        if self.failing_uploads.lock().unwrap().contains(name) {
            return Err(BlobError::Unavailable(format!("injected upload failure for {name}")));
        }
        self.inner.upload(name, data).await
    }

    async fn download(&self, address: &str) -> Result<Bytes, BlobError> {
        if self.failing_downloads.lock().unwrap().contains(address) {
            return Err(BlobError::Unavailable(format!(
                "injected download failure for {address}"
            )));
        }
        self.inner.download(address).await
    }
}

/// Document store wrapper whose attachment feed reads can be switched off.
struct FeedOutageStore {
    inner: MemoryDocumentStore<ResortDocument>,
    feed_down: AtomicBool,
}

impl FeedOutageStore {
    fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::new("feed-outage"),
            feed_down: AtomicBool::new(false),
        }
    }

    fn take_feed_down(&self) {
        self.feed_down.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore<ResortDocument> for FeedOutageStore {
    async fn read_page(
        &self,
        continuation: Option<&str>,
    ) -> Result<Page<ResortDocument>, DocumentError> {
        self.inner.read_page(continuation).await
    }

    async fn get(&self, id: &str) -> Result<Option<ResortDocument>, DocumentError> {
        self.inner.get(id).await
    }

    async fn insert(&self, item: &ResortDocument) -> Result<ResortDocument, DocumentError> {
        self.inner.insert(item).await
    }

    async fn replace(
        &self,
        id: &str,
        item: &ResortDocument,
    ) -> Result<ResortDocument, DocumentError> {
        self.inner.replace(id, item).await
    }

    async fn delete(&self, id: &str) -> Result<bool, DocumentError> {
        self.inner.delete(id).await
    }

    async fn write_attachment(
        &self,
        link: &DocumentLink,
        record: &AttachmentRecord,
        mode: AttachMode,
    ) -> Result<(), DocumentError> {
        self.inner.write_attachment(link, record, mode).await
    }

    async fn list_attachments(
        &self,
        link: &DocumentLink,
    ) -> Result<Vec<AttachmentRecord>, DocumentError> {
        if self.feed_down.load(Ordering::SeqCst) {
            return Err(DocumentError::Unavailable("attachment feed timed out".into()));
        }
        self.inner.list_attachments(link).await
    }
}

struct Harness {
    catalog: Catalog<ResortDocument>,
    documents: Arc<MemoryDocumentStore<ResortDocument>>,
    objects: Arc<FlakyObjectStore>,
}

fn harness_with(config: CatalogConfig) -> Harness {
    let documents = Arc::new(MemoryDocumentStore::<ResortDocument>::new("catalog-tests"));
    let objects = Arc::new(FlakyObjectStore::default());
    let catalog = Catalog::new(
        Arc::clone(&documents) as Arc<dyn DocumentStore<ResortDocument>>,
        Arc::clone(&objects) as Arc<dyn ObjectStore>,
        config,
    );
    Harness {
        catalog,
        documents,
        objects,
    }
}

fn harness() -> Harness {
    harness_with(CatalogConfig::default())
}

fn file(filename: &str, content_type: &str, body: &'static [u8]) -> UploadedFile {
    UploadedFile::new(filename, content_type, Bytes::from_static(body))
}

fn resort(name: &str, description: &str) -> ResortDocument {
    ResortDocument::new(name, description)
}

#[tokio::test]
async fn create_without_files_round_trips() {
    let h = harness();
    let stored = h
        .catalog
        .create(resort("Whistler", "Big mountain"), Vec::new())
        .await
        .unwrap();
    assert!(stored.is_complete());
    assert!(!stored.document.id.is_empty(), "create assigns an id");

    let read = h
        .catalog
        .get_with_images(&stored.document.id)
        .await
        .unwrap()
        .unwrap()
        .document;
    assert_eq!(read.name, "Whistler");
    assert_eq!(read.description, "Big mountain");
    assert!(read.images.is_empty());
}

#[tokio::test]
async fn create_assigns_fresh_ids() {
    let h = harness();
    let doc = resort("Same", "").with_id("caller-chosen");
    let first = h.catalog.create(doc.clone(), Vec::new()).await.unwrap();
    let second = h.catalog.create(doc, Vec::new()).await.unwrap();
    assert_ne!(first.document.id, "caller-chosen");
    assert_ne!(first.document.id, second.document.id);
    assert_eq!(h.documents.len(), 2);
}

#[tokio::test]
async fn images_resolve_in_upload_order_with_recorded_types() {
    let h = harness();
    let stored = h
        .catalog
        .create(
            resort("Zermatt", ""),
            vec![
                file("a.jpg", "image/jpeg", b"alpha"),
                file("b.png", "image/png", b"bravo"),
                file("c.gif", "image/gif", b"charlie"),
            ],
        )
        .await
        .unwrap();
    assert!(stored.is_complete());

    let read = h
        .catalog
        .get_with_images(&stored.document.id)
        .await
        .unwrap()
        .unwrap()
        .document;
    assert_eq!(
        read.images,
        vec![
            encode_data_url("image/jpeg", b"alpha"),
            encode_data_url("image/png", b"bravo"),
            encode_data_url("image/gif", b"charlie"),
        ]
    );
}

#[tokio::test]
async fn concurrent_transfers_keep_order() {
    let h = harness_with(CatalogConfig::default().with_transfer_concurrency(4));
    let files = (0..8)
        .map(|i| {
            UploadedFile::new(
                format!("photo{i}.png"),
                "image/png",
                Bytes::from(format!("body-{i}")),
            )
        })
        .collect();
    let stored = h.catalog.create(resort("Laax", ""), files).await.unwrap();
    assert!(stored.is_complete());

    let set = h.catalog.resolve_images(&stored.document).await.unwrap();
    let expected: Vec<_> = (0..8)
        .map(|i| encode_data_url("image/png", format!("body-{i}").as_bytes()))
        .collect();
    assert_eq!(set.images, expected);
}

#[tokio::test]
async fn missing_content_type_falls_back() {
    let h = harness_with(CatalogConfig::default().with_fallback_content_type("image/webp"));
    let stored = h
        .catalog
        .create(resort("Ischgl", ""), vec![file("x.bin", "", b"raw")])
        .await
        .unwrap();
    let set = h.catalog.resolve_images(&stored.document).await.unwrap();
    assert_eq!(set.images, vec![encode_data_url("image/webp", b"raw")]);
}

#[tokio::test]
async fn descriptor_names_follow_filename_rule() {
    let h = harness();
    let ingested = h
        .catalog
        .ingest_uploads(vec![
            file("photo.beach.jpg", "image/jpeg", b"1"),
            file(".hidden", "image/png", b"2"),
            file("", "image/png", b"4"),
            file("noext", "image/png", b"3"),
        ])
        .await;

    let names: Vec<_> = ingested.descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["photo", ".hidden", "noext"]);
    assert!(ingested.descriptors.iter().all(|d| d.address.is_some()));
    assert_eq!(ingested.descriptors[0].content_type, "image/jpeg");
    assert_eq!(
        ingested.rejected,
        vec![AttachmentFailure {
            name: String::new(),
            reason: AttachmentFailureReason::InvalidFilename,
        }]
    );
    assert_eq!(h.objects.inner.len(), 3, "rejected file is not uploaded");
}

#[tokio::test]
async fn empty_filename_is_reported_on_create() {
    let h = harness();
    let stored = h
        .catalog
        .create(
            resort("Saas-Fee", ""),
            vec![
                file("", "image/png", b"nameless"),
                file("a.jpg", "image/jpeg", b"a"),
            ],
        )
        .await
        .unwrap();

    assert!(!stored.is_complete());
    assert_eq!(stored.attachment_failures.len(), 1);
    assert_eq!(
        stored.attachment_failures[0].reason,
        AttachmentFailureReason::InvalidFilename
    );

    let link = stored.document.link().unwrap();
    let records = h.documents.list_attachments(&link).await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a"]);
}

#[tokio::test]
async fn empty_filename_is_reported_on_update() {
    let h = harness();
    let stored = h
        .catalog
        .create(resort("Arosa", ""), Vec::new())
        .await
        .unwrap();

    let updated = h
        .catalog
        .update(
            &stored.document.id,
            resort("Arosa", ""),
            vec![file("", "image/png", b"nameless")],
        )
        .await
        .unwrap();
    assert_eq!(
        updated.attachment_failures,
        vec![AttachmentFailure {
            name: String::new(),
            reason: AttachmentFailureReason::InvalidFilename,
        }]
    );
}

#[tokio::test]
async fn failed_upload_yields_unresolved_descriptor() {
    let h = harness();
    h.objects.fail_upload("b.png");
    let descriptors = h
        .catalog
        .ingest_uploads(vec![
            file("a.jpg", "image/jpeg", b"a"),
            file("b.png", "image/png", b"b"),
            file("c.gif", "image/gif", b"c"),
        ])
        .await
        .descriptors;

    assert_eq!(descriptors.len(), 3);
    assert!(descriptors[0].address.is_some());
    assert_eq!(descriptors[1], AttachmentDescriptor::unresolved("b", "image/png"));
    assert!(descriptors[2].address.is_some());
}

#[tokio::test]
async fn partial_upload_failure_still_creates_document() {
    let h = harness();
    h.objects.fail_upload("b.png");
    let stored = h
        .catalog
        .create(
            resort("Verbier", ""),
            vec![
                file("a.jpg", "image/jpeg", b"a"),
                file("b.png", "image/png", b"b"),
                file("c.gif", "image/gif", b"c"),
            ],
        )
        .await
        .unwrap();

    assert_eq!(stored.attachment_failures.len(), 1);
    assert_eq!(stored.attachment_failures[0].name, "b");
    assert_eq!(
        stored.attachment_failures[0].reason,
        AttachmentFailureReason::MissingAddress
    );

    let link = stored.document.link().unwrap();
    let records = h.documents.list_attachments(&link).await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["a", "c"]);

    let read = h
        .catalog
        .get_with_images(&stored.document.id)
        .await
        .unwrap()
        .unwrap()
        .document;
    assert_eq!(read.images.len(), 2);
}

#[tokio::test]
async fn update_without_files_keeps_attachments() {
    let h = harness();
    let stored = h
        .catalog
        .create(
            resort("Aspen", "old"),
            vec![
                file("a.jpg", "image/jpeg", b"a"),
                file("b.png", "image/png", b"b"),
            ],
        )
        .await
        .unwrap();
    let id = stored.document.id.clone();

    let updated = h
        .catalog
        .update(&id, resort("Aspen", "new description"), Vec::new())
        .await
        .unwrap();
    assert!(updated.is_complete());

    let read = h.catalog.get_with_images(&id).await.unwrap().unwrap().document;
    assert_eq!(read.description, "new description");
    assert_eq!(
        read.images,
        vec![
            encode_data_url("image/jpeg", b"a"),
            encode_data_url("image/png", b"b"),
        ]
    );
}

#[tokio::test]
async fn update_with_same_name_replaces_attachment() {
    let h = harness();
    let stored = h
        .catalog
        .create(
            resort("Vail", ""),
            vec![
                file("lift.jpg", "image/jpeg", b"old"),
                file("peak.png", "image/png", b"peak"),
            ],
        )
        .await
        .unwrap();
    let id = stored.document.id.clone();

    let updated = h
        .catalog
        .update(&id, resort("Vail", ""), vec![file("lift.gif", "image/gif", b"new")])
        .await
        .unwrap();
    assert!(updated.is_complete());

    let link = updated.document.link().unwrap();
    let records = h.documents.list_attachments(&link).await.unwrap();
    assert_eq!(records.len(), 2, "same-named attachment must not duplicate");

    let read = h.catalog.get_with_images(&id).await.unwrap().unwrap().document;
    assert!(read.images.contains(&encode_data_url("image/gif", b"new")));
    assert!(read.images.contains(&encode_data_url("image/png", b"peak")));
    assert!(!read.images.contains(&encode_data_url("image/jpeg", b"old")));
}

#[tokio::test]
async fn update_forces_target_id() {
    let h = harness();
    let stored = h
        .catalog
        .create(resort("Niseko", ""), Vec::new())
        .await
        .unwrap();
    let id = stored.document.id.clone();

    let updated = h
        .catalog
        .update(&id, resort("Niseko Hirafu", "").with_id("other"), Vec::new())
        .await
        .unwrap();
    assert_eq!(updated.document.id, id);
    assert_eq!(h.documents.len(), 1);
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let h = harness();
    let err = h
        .catalog
        .update("missing", resort("x", ""), vec![file("a.png", "image/png", b"a")])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::NotFound(_)));
}

#[tokio::test]
async fn delete_leaves_binaries_fetchable() {
    let h = harness();
    let stored = h
        .catalog
        .create(resort("Chamonix", ""), vec![file("a.jpg", "image/jpeg", b"kept")])
        .await
        .unwrap();
    let id = stored.document.id.clone();
    let link = stored.document.link().unwrap();
    let addresses = h.documents.list_attachment_addresses(&link).await.unwrap();

    assert!(h.catalog.delete(&id).await.unwrap());
    assert!(h.catalog.get(&id).await.unwrap().is_none());
    assert!(!h.catalog.delete(&id).await.unwrap());

    let data = h.objects.download(&addresses[0]).await.unwrap();
    assert_eq!(data.as_ref(), b"kept");
}

#[tokio::test]
async fn failed_download_skips_only_that_image() {
    let h = harness();
    let stored = h
        .catalog
        .create(
            resort("Courchevel", ""),
            vec![
                file("a.jpg", "image/jpeg", b"a"),
                file("b.png", "image/png", b"b"),
                file("c.gif", "image/gif", b"c"),
            ],
        )
        .await
        .unwrap();
    let link = stored.document.link().unwrap();
    let addresses = h.documents.list_attachment_addresses(&link).await.unwrap();
    h.objects.fail_download(&addresses[1]);

    let set = h.catalog.resolve_images(&stored.document).await.unwrap();
    assert_eq!(
        set.images,
        vec![
            encode_data_url("image/jpeg", b"a"),
            encode_data_url("image/gif", b"c"),
        ]
    );
    assert_eq!(set.failures.len(), 1);
    assert_eq!(set.failures[0].address, addresses[1]);
    assert!(set.failures[0].error.is_retryable());
}

#[tokio::test]
async fn list_with_images_resolves_every_document() {
    let h = harness();
    let first = h
        .catalog
        .create(resort("St. Anton", ""), vec![file("a.jpg", "image/jpeg", b"a")])
        .await
        .unwrap();
    let second = h
        .catalog
        .create(resort("Lech", ""), Vec::new())
        .await
        .unwrap();

    let listing = h.catalog.list_with_images().await;
    assert!(listing.is_complete());
    assert_eq!(listing.items.len(), 2);

    assert!(listing.items.iter().all(WithImages::is_complete));

    let with_image = listing
        .items
        .iter()
        .find(|item| item.document.id == first.document.id)
        .unwrap();
    assert_eq!(
        with_image.document.images,
        vec![encode_data_url("image/jpeg", b"a")]
    );
    let without = listing
        .items
        .iter()
        .find(|item| item.document.id == second.document.id)
        .unwrap();
    assert!(without.document.images.is_empty());
    assert_eq!(without.images.as_ref().unwrap(), &ImageSet::default());
}

#[tokio::test]
async fn unpersisted_document_has_no_images() {
    let h = harness();
    let set = h
        .catalog
        .resolve_images(&resort("Draft", ""))
        .await
        .unwrap();
    assert!(set.is_complete());
    assert!(set.images.is_empty());
}

#[tokio::test]
async fn download_failures_surface_through_inbound_reads() {
    let h = harness();
    let stored = h
        .catalog
        .create(
            resort("Davos", ""),
            vec![
                file("a.jpg", "image/jpeg", b"a"),
                file("b.png", "image/png", b"b"),
            ],
        )
        .await
        .unwrap();
    let link = stored.document.link().unwrap();
    let addresses = h.documents.list_attachment_addresses(&link).await.unwrap();
    for address in &addresses {
        h.objects.fail_download(address);
    }

    let read = h
        .catalog
        .get_with_images(&stored.document.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!read.is_complete());
    assert_eq!(read.failure_count(), 2);
    let set = read.images.as_ref().unwrap();
    assert!(set.images.is_empty());
    let failed: Vec<_> = set.failures.iter().map(|f| f.address.clone()).collect();
    assert_eq!(failed, addresses);
    assert!(set.failures.iter().all(|f| f.error.is_retryable()));

    let listing = h.catalog.list_with_images().await;
    assert!(listing.is_complete(), "document pages were all read");
    assert_eq!(listing.items.len(), 1);
    assert!(!listing.items[0].is_complete());
    assert_eq!(listing.items[0].failure_count(), 2);
}

#[tokio::test]
async fn unreadable_feed_is_reported_per_document() {
    let documents = Arc::new(FeedOutageStore::new());
    let objects = Arc::new(MemoryObjectStore::default());
    let catalog = Catalog::new(
        Arc::clone(&documents) as Arc<dyn DocumentStore<ResortDocument>>,
        objects as Arc<dyn ObjectStore>,
        CatalogConfig::default(),
    );
    let stored = catalog
        .create(resort("Gstaad", ""), vec![file("a.jpg", "image/jpeg", b"a")])
        .await
        .unwrap();
    assert!(stored.is_complete());
    documents.take_feed_down();

    let read = catalog
        .get_with_images(&stored.document.id)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(read.images, Err(DocumentError::Unavailable(_))));
    assert!(!read.is_complete());
    assert_eq!(read.failure_count(), 1);
    assert!(read.document.images.is_empty());

    let listing = catalog.list_with_images().await;
    assert!(listing.is_complete());
    assert_eq!(listing.items.len(), 1);
    assert!(matches!(
        listing.items[0].images,
        Err(DocumentError::Unavailable(_))
    ));
}
