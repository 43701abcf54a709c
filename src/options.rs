/// Configures per-attempt timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Total number of attempts, including the first one.
    pub max_attempts: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    ///
    /// `0` retries immediately.
    pub retry_backoff_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_attempts: 3,
            retry_backoff_ms: 0,
        }
    }
}

impl ClientOptions {
    /// Delay before attempt `next_attempt` (1-based), or `None` for an immediate retry.
    pub(crate) fn backoff_before(&self, next_attempt: usize) -> Option<u64> {
        if self.retry_backoff_ms == 0 {
            return None;
        }
        let exp = next_attempt.saturating_sub(2).min(16) as u32;
        Some(self.retry_backoff_ms.saturating_mul(1u64 << exp))
    }
}

#[cfg(test)]
mod tests {
    use crate::ClientOptions;

    #[test]
    fn defaults_match_upstream_client() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout_ms, 10_000);
        assert_eq!(opts.max_attempts, 3);
        assert_eq!(opts.retry_backoff_ms, 0);
    }

    #[test]
    fn zero_backoff_retries_immediately() {
        let opts = ClientOptions::default();
        assert_eq!(opts.backoff_before(2), None);
        assert_eq!(opts.backoff_before(3), None);
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let opts = ClientOptions {
            retry_backoff_ms: 100,
            ..ClientOptions::default()
        };
        assert_eq!(opts.backoff_before(2), Some(100));
        assert_eq!(opts.backoff_before(3), Some(200));
        assert_eq!(opts.backoff_before(4), Some(400));
        assert_eq!(opts.backoff_before(100), Some(100 << 16));
    }
}
