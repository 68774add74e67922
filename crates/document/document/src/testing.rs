use resorts_core::{AttachmentDescriptor, Document, ResortDocument, new_document_id};

use crate::error::DocumentError;
use crate::outcome::AttachmentFailureReason;
use crate::store::{AttachMode, DocumentStore};

fn missing(what: &str) -> DocumentError {
    DocumentError::Invalid(format!("conformance: {what}"))
}

fn fresh(name: &str) -> ResortDocument {
    ResortDocument::new(name, format!("{name} description")).with_id(new_document_id())
}

/// Run the document store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// Every test uses newly generated ids, so the suite may also be pointed at
/// a shared store.
///
/// # Errors
///
/// Returns an error if a store operation fails unexpectedly.
pub async fn run_document_store_conformance_tests(
    store: &dyn DocumentStore<ResortDocument>,
) -> Result<(), DocumentError> {
    test_get_missing(store).await?;
    test_create_and_get(store).await?;
    test_attachments_keep_order(store).await?;
    test_unresolved_descriptor_is_reported(store).await?;
    test_update_upserts_attachments(store).await?;
    test_update_missing(store).await?;
    test_duplicate_insert_conflicts(store).await?;
    test_duplicate_attachment_conflicts(store).await?;
    test_delete(store).await?;
    test_list_all(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn DocumentStore<ResortDocument>) -> Result<(), DocumentError> {
    let found = store.get(&new_document_id()).await?;
    assert!(found.is_none(), "get on a missing id should return None");
    Ok(())
}

async fn test_create_and_get(store: &dyn DocumentStore<ResortDocument>) -> Result<(), DocumentError> {
    let doc = fresh("Whistler");
    let stored = store.create(&doc, &[]).await?;
    assert!(stored.is_complete());
    assert_eq!(stored.document.id, doc.id);
    assert!(
        stored.document.self_link().is_some(),
        "stored document should carry a self link"
    );

    let read = store.get(&doc.id).await?.ok_or_else(|| missing("created document should be readable"))?;
    assert_eq!(read.name, "Whistler");
    assert_eq!(read.description, "Whistler description");
    assert_eq!(read.self_link, stored.document.self_link);
    Ok(())
}

async fn test_attachments_keep_order(
    store: &dyn DocumentStore<ResortDocument>,
) -> Result<(), DocumentError> {
    let doc = fresh("Zermatt");
    let descriptors = vec![
        AttachmentDescriptor::new("village", "mem://village.jpg", "image/jpeg"),
        AttachmentDescriptor::new("peak", "mem://peak.png", "image/png"),
        AttachmentDescriptor::new("lift", "mem://lift.gif", "image/gif"),
    ];
    let stored = store.create(&doc, &descriptors).await?;
    assert!(stored.is_complete(), "all attachments should be written");

    let link = stored.document.link().ok_or_else(|| missing("self link"))?;
    let records = store.list_attachments(&link).await?;
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["village", "peak", "lift"]);
    let types: Vec<_> = records.iter().map(|r| r.content_type.as_str()).collect();
    assert_eq!(types, ["image/jpeg", "image/png", "image/gif"]);

    let addresses = store.list_attachment_addresses(&link).await?;
    assert_eq!(
        addresses,
        vec!["mem://village.jpg", "mem://peak.png", "mem://lift.gif"]
    );
    Ok(())
}

async fn test_unresolved_descriptor_is_reported(
    store: &dyn DocumentStore<ResortDocument>,
) -> Result<(), DocumentError> {
    let doc = fresh("Verbier");
    let descriptors = vec![
        AttachmentDescriptor::unresolved("lost", "image/png"),
        AttachmentDescriptor::new("kept", "mem://kept.png", "image/png"),
    ];
    let stored = store.create(&doc, &descriptors).await?;
    assert_eq!(stored.attachment_failures.len(), 1);
    assert_eq!(stored.attachment_failures[0].name, "lost");
    assert_eq!(
        stored.attachment_failures[0].reason,
        AttachmentFailureReason::MissingAddress
    );

    let link = stored.document.link().ok_or_else(|| missing("self link"))?;
    let addresses = store.list_attachment_addresses(&link).await?;
    assert_eq!(addresses, vec!["mem://kept.png"]);
    Ok(())
}

async fn test_update_upserts_attachments(
    store: &dyn DocumentStore<ResortDocument>,
) -> Result<(), DocumentError> {
    let doc = fresh("Aspen");
    let stored = store
        .create(
            &doc,
            &[
                AttachmentDescriptor::new("a", "mem://a-v1.png", "image/png"),
                AttachmentDescriptor::new("b", "mem://b.png", "image/png"),
            ],
        )
        .await?;
    assert!(stored.is_complete());

    let mut changed = doc.clone();
    changed.name = "Aspen Snowmass".into();
    let updated = store
        .update(
            &doc.id,
            &changed,
            &[
                AttachmentDescriptor::new("a", "mem://a-v2.jpg", "image/jpeg"),
                AttachmentDescriptor::new("c", "mem://c.png", "image/png"),
            ],
        )
        .await?;
    assert!(updated.is_complete(), "upserts should not conflict");
    assert_eq!(updated.document.name, "Aspen Snowmass");

    let read = store.get(&doc.id).await?.ok_or_else(|| missing("updated document"))?;
    assert_eq!(read.name, "Aspen Snowmass");

    let link = updated.document.link().ok_or_else(|| missing("self link"))?;
    let records = store.list_attachments(&link).await?;
    assert_eq!(records.len(), 3, "same-named attachment should be replaced");
    let a = records.iter().find(|r| r.id == "a").ok_or_else(|| missing("attachment a"))?;
    assert_eq!(a.media, "mem://a-v2.jpg");
    assert_eq!(a.content_type, "image/jpeg");
    assert!(records.iter().any(|r| r.id == "b"), "untouched attachment kept");
    assert!(records.iter().any(|r| r.id == "c"), "new attachment added");
    Ok(())
}

async fn test_update_missing(store: &dyn DocumentStore<ResortDocument>) -> Result<(), DocumentError> {
    let doc = fresh("Nowhere");
    let result = store
        .update(
            &doc.id,
            &doc,
            &[AttachmentDescriptor::new("x", "mem://x.png", "image/png")],
        )
        .await;
    assert!(
        matches!(result, Err(DocumentError::NotFound(_))),
        "update of a missing id should fail with NotFound, got {result:?}"
    );
    Ok(())
}

async fn test_duplicate_insert_conflicts(
    store: &dyn DocumentStore<ResortDocument>,
) -> Result<(), DocumentError> {
    let doc = fresh("Vail");
    store.insert(&doc).await?;
    let result = store.insert(&doc).await;
    assert!(
        matches!(result, Err(DocumentError::Conflict(_))),
        "second insert with the same id should conflict, got {result:?}"
    );
    Ok(())
}

async fn test_duplicate_attachment_conflicts(
    store: &dyn DocumentStore<ResortDocument>,
) -> Result<(), DocumentError> {
    let doc = fresh("Chamonix");
    let stored = store
        .create(
            &doc,
            &[
                AttachmentDescriptor::new("dup", "mem://dup-1.png", "image/png"),
                AttachmentDescriptor::new("dup", "mem://dup-2.png", "image/png"),
            ],
        )
        .await?;
    assert_eq!(stored.attachment_failures.len(), 1);
    assert!(matches!(
        stored.attachment_failures[0].reason,
        AttachmentFailureReason::Store(DocumentError::Conflict(_))
    ));

    let link = stored.document.link().ok_or_else(|| missing("self link"))?;
    let addresses = store.list_attachment_addresses(&link).await?;
    assert_eq!(addresses, vec!["mem://dup-1.png"], "first write wins");

    let record = resorts_core::AttachmentRecord {
        id: "dup".into(),
        media: "mem://dup-3.png".into(),
        content_type: "image/png".into(),
    };
    store
        .write_attachment(&link, &record, AttachMode::Upsert)
        .await?;
    let addresses = store.list_attachment_addresses(&link).await?;
    assert_eq!(addresses, vec!["mem://dup-3.png"]);
    Ok(())
}

async fn test_delete(store: &dyn DocumentStore<ResortDocument>) -> Result<(), DocumentError> {
    let doc = fresh("Niseko");
    store.create(&doc, &[]).await?;
    assert!(store.delete(&doc.id).await?, "delete should report existing document");
    assert!(store.get(&doc.id).await?.is_none());
    assert!(!store.delete(&doc.id).await?, "second delete should report absence");
    Ok(())
}

async fn test_list_all(store: &dyn DocumentStore<ResortDocument>) -> Result<(), DocumentError> {
    let first = fresh("Courchevel");
    let second = fresh("St. Anton");
    store.create(&first, &[]).await?;
    store.create(&second, &[]).await?;

    let listing = store.list_all().await;
    assert!(listing.is_complete(), "listing should not be interrupted");
    for id in [&first.id, &second.id] {
        let found = listing
            .items
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| missing("created document should be listed"))?;
        assert!(found.self_link.is_some());
    }
    Ok(())
}
