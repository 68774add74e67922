use bytes::Bytes;

/// A file supplied by the request-handling layer for ingestion.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as supplied by the client.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file content.
    pub data: Bytes,
}

impl UploadedFile {
    /// Create a new uploaded file.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Derive the attachment name for an uploaded filename.
///
/// Returns the substring before the first `.`. When that prefix is empty
/// (`.hidden`) or there is no `.` at all (`noext`), the whole filename is
/// used. Returns `None` for an empty filename.
pub fn descriptor_name(filename: &str) -> Option<&str> {
    if filename.is_empty() {
        return None;
    }
    match filename.split_once('.') {
        Some((stem, _)) if !stem.is_empty() => Some(stem),
        _ => Some(filename),
    }
}
