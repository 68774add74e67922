use bytes::Bytes;

use crate::error::BlobError;
use crate::store::ObjectStore;

/// Run the object store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if a store operation fails unexpectedly.
pub async fn run_object_store_conformance_tests(store: &dyn ObjectStore) -> Result<(), BlobError> {
    test_upload_then_download(store).await?;
    test_reupload_overwrites(store).await?;
    test_download_many_keeps_order(store).await?;
    test_download_many_isolates_failures(store).await?;
    Ok(())
}

async fn test_upload_then_download(store: &dyn ObjectStore) -> Result<(), BlobError> {
    let address = store
        .upload("conformance-a.png", Bytes::from_static(b"alpha"))
        .await?;
    assert!(!address.is_empty(), "upload should return an address");
    let data = store.download(&address).await?;
    assert_eq!(data.as_ref(), b"alpha");
    Ok(())
}

async fn test_reupload_overwrites(store: &dyn ObjectStore) -> Result<(), BlobError> {
    let first = store
        .upload("conformance-b.png", Bytes::from_static(b"first"))
        .await?;
    let second = store
        .upload("conformance-b.png", Bytes::from_static(b"second"))
        .await?;
    assert_eq!(first, second, "same name should map to the same address");
    let data = store.download(&second).await?;
    assert_eq!(data.as_ref(), b"second", "re-upload should overwrite");
    Ok(())
}

async fn test_download_many_keeps_order(store: &dyn ObjectStore) -> Result<(), BlobError> {
    let mut addresses = Vec::new();
    for (name, body) in [("order-1.jpg", "one"), ("order-2.png", "two"), ("order-3.gif", "three")] {
        addresses.push(store.upload(name, Bytes::from(body)).await?);
    }
    addresses.reverse();

    let results = store.download_many(&addresses).await;
    let bodies: Vec<Bytes> = results.into_iter().collect::<Result<_, _>>()?;
    assert_eq!(bodies, vec!["three", "two", "one"]);
    Ok(())
}

async fn test_download_many_isolates_failures(store: &dyn ObjectStore) -> Result<(), BlobError> {
    let good = store
        .upload("isolated.png", Bytes::from_static(b"ok"))
        .await?;
    let missing = good.replace("isolated.png", "never-uploaded.png");

    let results = store.download_many(&[missing, good]).await;
    assert_eq!(results.len(), 2);
    assert!(
        matches!(results[0], Err(BlobError::NotFound(_))),
        "missing binary should fail on its own"
    );
    assert_eq!(results[1].as_deref().map_err(Clone::clone)?, b"ok");
    Ok(())
}
