use serde::{Deserialize, Serialize};

/// A descriptor built while ingesting an upload, before it is attached to a
/// document.
///
/// `address` is `None` when the binary upload failed; such descriptors are
/// never written to the attachment feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    /// Short name derived from the original filename. Used as the attachment id.
    pub name: String,
    /// Object store address of the binary content.
    pub address: Option<String>,
    /// Declared MIME type of the upload.
    pub content_type: String,
}

impl AttachmentDescriptor {
    /// Create a descriptor for a successfully uploaded binary.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: Some(address.into()),
            content_type: content_type.into(),
        }
    }

    /// Create a descriptor for an upload that produced no address.
    pub fn unresolved(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            content_type: content_type.into(),
        }
    }

    /// Convert into the persisted record, if the descriptor has an address.
    pub fn to_record(&self) -> Option<AttachmentRecord> {
        self.address.as_ref().map(|media| AttachmentRecord {
            id: self.name.clone(),
            media: media.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

/// An attachment record as stored in a document's attachment feed.
///
/// Persisted as `{ "id", "media", "contentType" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Attachment id (the descriptor name).
    pub id: String,
    /// Object store address of the binary.
    pub media: String,
    /// Recorded MIME type.
    #[serde(rename = "contentType", default)]
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_store_field_names() {
        let descriptor = AttachmentDescriptor::new("beach", "https://acct/c/beach.jpg", "image/jpeg");
        let record = descriptor.to_record().unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "beach",
                "media": "https://acct/c/beach.jpg",
                "contentType": "image/jpeg"
            })
        );
    }

    #[test]
    fn unresolved_descriptor_has_no_record() {
        let descriptor = AttachmentDescriptor::unresolved("lost", "image/png");
        assert!(descriptor.to_record().is_none());
    }

    #[test]
    fn record_tolerates_missing_content_type() {
        let record: AttachmentRecord =
            serde_json::from_str(r#"{"id":"a","media":"m","_rid":"x"}"#).unwrap();
        assert_eq!(record.content_type, "");
    }
}
