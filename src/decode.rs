use serde::de::DeserializeOwned;

use crate::retry::AttemptError;

/// Returns true for `application/octet-stream` and any `image/*` media type.
pub(crate) fn is_binary_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/octet-stream" || media_type.starts_with("image/")
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, AttemptError> {
    serde_json::from_str::<T>(body)
        .map_err(|err| AttemptError::Decode(format!("invalid response JSON: {err}; body: {body}")))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use crate::{decode, retry::AttemptError};

    #[test]
    fn octet_stream_and_images_are_binary() {
        assert!(decode::is_binary_content_type("application/octet-stream"));
        assert!(decode::is_binary_content_type("image/png"));
        assert!(decode::is_binary_content_type("IMAGE/JPEG; charset=binary"));
        assert!(decode::is_binary_content_type(" image/webp "));
    }

    #[test]
    fn json_and_text_are_not_binary() {
        assert!(!decode::is_binary_content_type("application/json"));
        assert!(!decode::is_binary_content_type("text/html; charset=utf-8"));
        assert!(!decode::is_binary_content_type(""));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Echo {
        a: String,
    }

    #[test]
    fn decode_json_maps_errors_to_attempt_decode() {
        let echo: Echo = decode::decode_json(r#"{"a":"1"}"#).expect("must decode");
        assert_eq!(echo, Echo { a: "1".to_owned() });

        let err = decode::decode_json::<Echo>("<html>").expect_err("must fail");
        assert!(matches!(err, AttemptError::Decode(_)));
    }
}
