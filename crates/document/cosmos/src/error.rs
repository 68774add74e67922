use resorts_document::DocumentError;

/// Map a non-success Cosmos DB response to a [`DocumentError`].
///
/// `target` names the resource the request addressed and is carried in
/// `NotFound` and `Conflict`.
pub fn classify_status(status: u16, body: &str, target: &str) -> DocumentError {
    match status {
        404 => DocumentError::NotFound(target.to_owned()),
        409 => DocumentError::Conflict(target.to_owned()),
        408 | 429 | 449 | 500..=599 => {
            DocumentError::Unavailable(format!("HTTP {status}: {}", summarize(body)))
        }
        _ => DocumentError::Rejected {
            status,
            message: summarize(body),
        },
    }
}

/// Map a transport failure (connect, timeout, body read) to a [`DocumentError`].
pub fn classify_transport(err: &reqwest::Error) -> DocumentError {
    if err.is_decode() {
        DocumentError::Serialization(err.to_string())
    } else {
        DocumentError::Unavailable(err.to_string())
    }
}

/// Pull the `message` out of a Cosmos error body, falling back to the raw text.
fn summarize(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_conflict_carry_target() {
        assert_eq!(
            classify_status(404, "", "r-1"),
            DocumentError::NotFound("r-1".into())
        );
        assert_eq!(
            classify_status(409, "{}", "r-1"),
            DocumentError::Conflict("r-1".into())
        );
    }

    #[test]
    fn throttling_and_server_errors_are_retryable() {
        for status in [408, 429, 449, 500, 503] {
            let err = classify_status(status, "busy", "x");
            assert!(err.is_retryable(), "{status} should be retryable");
        }
    }

    #[test]
    fn client_errors_are_rejected_with_message() {
        let body = r#"{"code":"Unauthorized","message":"The input authorization token can't serve the request."}"#;
        assert_eq!(
            classify_status(401, body, "x"),
            DocumentError::Rejected {
                status: 401,
                message: "The input authorization token can't serve the request.".into()
            }
        );
        assert_eq!(
            classify_status(400, "plain text ", "x"),
            DocumentError::Rejected {
                status: 400,
                message: "plain text".into()
            }
        );
    }
}
