use base64::Engine;

/// Encode binary content as a self-describing `data:` URL.
pub fn encode_data_url(content_type: &str, data: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{content_type};base64,{payload}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_given_content_type() {
        assert_eq!(
            encode_data_url("image/jpeg", b"hi"),
            "data:image/jpeg;base64,aGk="
        );
    }

    #[test]
    fn empty_payload() {
        assert_eq!(encode_data_url("image/png", b""), "data:image/png;base64,");
    }
}
