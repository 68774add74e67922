use azure_core::error::ErrorKind;

use resorts_blob::BlobError;

/// Classify a blob service error response into the appropriate [`BlobError`].
///
/// `error_code` is the service's `x-ms-error-code` when it sent one.
/// `target` names the blob address (or container) the request was for and
/// is carried in `NotFound`.
pub fn classify_status(
    status: u16,
    error_code: Option<&str>,
    message: &str,
    target: &str,
) -> BlobError {
    let code_not_found = error_code.is_some_and(|code| code.ends_with("NotFound"));
    match status {
        404 => BlobError::NotFound(target.to_owned()),
        _ if code_not_found => BlobError::NotFound(target.to_owned()),
        408 | 429 | 500..=599 => BlobError::Unavailable(message.to_owned()),
        _ => BlobError::Rejected(message.to_owned()),
    }
}

/// Returns `true` if a response reports that the container already exists.
pub fn is_already_exists(status: u16, error_code: Option<&str>) -> bool {
    status == 409 && error_code.is_none_or(|code| code == "ContainerAlreadyExists")
}

/// Classify an Azure SDK error by the HTTP status and error code it carries.
///
/// Errors raised before a response arrived are `Unavailable` when they come
/// from the transport and `Rejected` otherwise.
pub fn classify_azure_error(error: &azure_core::Error, target: &str) -> BlobError {
    match error.kind() {
        ErrorKind::HttpResponse {
            status, error_code, ..
        } => classify_status(
            u16::from(*status),
            error_code.as_deref(),
            &error.to_string(),
            target,
        ),
        ErrorKind::Io => BlobError::Unavailable(error.to_string()),
        _ => BlobError::Rejected(error.to_string()),
    }
}

/// Returns `true` if an SDK error reports that the container already exists.
pub fn sdk_already_exists(error: &azure_core::Error) -> bool {
    match error.kind() {
        ErrorKind::HttpResponse {
            status, error_code, ..
        } => is_already_exists(u16::from(*status), error_code.as_deref()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_by_status_or_code() {
        let err = classify_status(404, None, "HTTP 404", "https://a/c/x.png");
        assert_eq!(err, BlobError::NotFound("https://a/c/x.png".into()));

        let err = classify_status(400, Some("ContainerNotFound"), "HTTP 400", "c");
        assert_eq!(err, BlobError::NotFound("c".into()));
    }

    #[test]
    fn throttling_and_server_errors_are_unavailable() {
        for status in [408, 429, 500, 503] {
            let err = classify_status(status, None, "busy", "x");
            assert!(err.is_retryable(), "status {status}");
        }
    }

    #[test]
    fn client_errors_are_rejected() {
        let err = classify_status(403, Some("AuthorizationFailure"), "HTTP 403", "x");
        assert!(matches!(err, BlobError::Rejected(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn digits_in_the_target_do_not_change_the_class() {
        let target = "https://acct.blob.core.windows.net/photos/img500-404.png";
        let err = classify_status(403, Some("AuthorizationFailure"), target, target);
        assert!(matches!(err, BlobError::Rejected(_)));
    }

    #[test]
    fn detects_existing_container() {
        assert!(is_already_exists(409, Some("ContainerAlreadyExists")));
        assert!(is_already_exists(409, None));
        assert!(!is_already_exists(409, Some("ContainerBeingDeleted")));
        assert!(!is_already_exists(403, Some("ContainerAlreadyExists")));
    }
}
