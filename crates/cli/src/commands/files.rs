use std::path::Path;

use anyhow::Context;
use bytes::Bytes;

use resorts_core::UploadedFile;

/// Guess a MIME type from a file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Read a file from disk as an upload, keeping its file name.
pub fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?;
    Ok(UploadedFile::new(
        filename,
        content_type_for(path),
        Bytes::from(data),
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn guesses_common_image_types() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("dir/b.png")), "image/png");
        assert_eq!(content_type_for(Path::new("c.gif")), "image/gif");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn reads_file_with_name_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beach.photo.jpeg");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"jpeg-bytes")
            .unwrap();

        let upload = read_upload(&path).unwrap();
        assert_eq!(upload.filename, "beach.photo.jpeg");
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(upload.data.as_ref(), b"jpeg-bytes");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_upload(Path::new("/nonexistent/photo.png")).is_err());
    }
}
