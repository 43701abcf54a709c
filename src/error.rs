/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum SiputzxError {
    /// Every attempt ended with the per-attempt deadline.
    #[error("request to {endpoint} timed out after {attempts} attempt(s)")]
    Timeout { endpoint: String, attempts: usize },
    /// Connection-level failure from `reqwest` that persisted through the attempt budget.
    #[error("transport error on {endpoint} after {attempts} attempt(s): {source}")]
    Transport {
        endpoint: String,
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status} on {endpoint} after {attempts} attempt(s): {body}")]
    Http {
        endpoint: String,
        attempts: usize,
        status: u16,
        body: String,
    },
    /// Binary request answered with a payload that is neither octet-stream nor an image.
    #[error("expected binary data from {endpoint}, got content type '{content_type}'")]
    UnexpectedContentType {
        endpoint: String,
        content_type: String,
    },
    /// Retry loop finished without any attempt being classified.
    #[error("request to {endpoint} failed after {attempts} attempt(s)")]
    ExhaustedRetries { endpoint: String, attempts: usize },
    /// Response decoding or body serialization error.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request could not be built (empty endpoint, bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Upstream answered `status: false` inside a successful HTTP response.
    #[error("api error: {message}")]
    Api { message: String },
}

impl SiputzxError {
    /// Number of network attempts the failed call consumed, when it got that far.
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Self::Timeout { attempts, .. }
            | Self::Transport { attempts, .. }
            | Self::Http { attempts, .. }
            | Self::ExhaustedRetries { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
