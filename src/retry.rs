//! Per-attempt failure classification.
//!
//! Each attempt yields either a decoded payload or an [`AttemptError`]; whether
//! the loop goes on is decided only by [`should_retry`].

use reqwest::StatusCode;

use crate::SiputzxError;

/// Failure of a single attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Response received with a non-2xx status.
    Status { status: StatusCode, body: String },
    /// Per-attempt deadline fired before the response was fully read.
    Timeout,
    /// Connection, DNS or body-read failure.
    Transport(reqwest::Error),
    /// Successful status, but the payload is not binary.
    UnexpectedContentType(String),
    /// Successful status, but the body did not decode.
    Decode(String),
}

/// 5xx statuses, timeouts and transport errors are transient; everything else fails fast.
pub fn should_retry(err: &AttemptError) -> bool {
    match err {
        AttemptError::Status { status, .. } => status.is_server_error(),
        AttemptError::Timeout | AttemptError::Transport(_) => true,
        AttemptError::UnexpectedContentType(_) | AttemptError::Decode(_) => false,
    }
}

/// Per-call lifecycle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttemptState {
    Attempting(usize),
    Done,
    Failed,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Advances after attempt `n` failed with `err`.
    pub fn after_failure(n: usize, max_attempts: usize, err: &AttemptError) -> Self {
        if should_retry(err) && n < max_attempts {
            Self::Attempting(n + 1)
        } else {
            Self::Failed
        }
    }
}

/// Converts the last attempt failure into the caller-facing error.
pub(crate) fn into_final_error(
    err: AttemptError,
    endpoint: &str,
    attempts: usize,
) -> SiputzxError {
    let endpoint = endpoint.to_owned();
    match err {
        AttemptError::Status { status, body } => SiputzxError::Http {
            endpoint,
            attempts,
            status: status.as_u16(),
            body,
        },
        AttemptError::Timeout => SiputzxError::Timeout { endpoint, attempts },
        AttemptError::Transport(source) => SiputzxError::Transport {
            endpoint,
            attempts,
            source,
        },
        AttemptError::UnexpectedContentType(content_type) => {
            SiputzxError::UnexpectedContentType {
                endpoint,
                content_type,
            }
        }
        AttemptError::Decode(message) => {
            SiputzxError::Decode(format!("{endpoint}: {message}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::{into_final_error, should_retry, AttemptError, AttemptState};
    use crate::SiputzxError;

    fn status(code: u16) -> AttemptError {
        AttemptError::Status {
            status: StatusCode::from_u16(code).expect("valid status"),
            body: String::new(),
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        for code in [500, 502, 503, 504, 599] {
            assert!(should_retry(&status(code)), "{code} must retry");
        }
    }

    #[test]
    fn client_errors_fail_fast() {
        for code in [400, 401, 404, 429] {
            assert!(!should_retry(&status(code)), "{code} must not retry");
        }
    }

    #[test]
    fn timeouts_retry_but_payload_problems_do_not() {
        assert!(should_retry(&AttemptError::Timeout));
        assert!(!should_retry(&AttemptError::UnexpectedContentType(
            "application/json".to_owned()
        )));
        assert!(!should_retry(&AttemptError::Decode("eof".to_owned())));
    }

    #[test]
    fn state_machine_stops_at_budget() {
        assert_eq!(
            AttemptState::after_failure(1, 3, &status(503)),
            AttemptState::Attempting(2)
        );
        assert_eq!(
            AttemptState::after_failure(3, 3, &status(503)),
            AttemptState::Failed
        );
        assert_eq!(
            AttemptState::after_failure(1, 3, &status(404)),
            AttemptState::Failed
        );
        assert!(AttemptState::Done.is_terminal());
        assert!(!AttemptState::Attempting(2).is_terminal());
    }

    #[test]
    fn final_error_keeps_classification() {
        let err = into_final_error(AttemptError::Timeout, "echo", 3);
        assert!(matches!(err, SiputzxError::Timeout { attempts: 3, .. }));

        let err = into_final_error(status(404), "echo", 1);
        assert!(matches!(
            err,
            SiputzxError::Http {
                status: 404,
                attempts: 1,
                ..
            }
        ));
    }
}
