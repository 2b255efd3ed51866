use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded retry policy for external-call boundaries
///
/// Retries a fallible async operation up to `max_attempts` times with
/// exponential backoff, independent of any web-request lifecycle. The last
/// error is returned unchanged when the attempts are exhausted.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    let delay = self.base_backoff * 2u32.saturating_pow(attempt - 1);
                    tracing::warn!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_succeeds_first_try() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Cell::new(0u32);

        let result: Result<u32, String> = tokio_test::block_on(policy.run(|| {
            calls.set(calls.get() + 1);
            async { Ok(42) }
        }));

        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retries_until_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Cell::new(0u32);

        let result: Result<u32, String> = tokio_test::block_on(policy.run(|| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err("transient".to_string())
                } else {
                    Ok(7)
                }
            }
        }));

        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_exhausts_attempts() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let calls = Cell::new(0u32);

        let result: Result<u32, String> = tokio_test::block_on(policy.run(|| {
            calls.set(calls.get() + 1);
            async { Err("down".to_string()) }
        }));

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_no_retry_policy() {
        let policy = RetryPolicy::none();
        let calls = Cell::new(0u32);

        let result: Result<u32, String> = tokio_test::block_on(policy.run(|| {
            calls.set(calls.get() + 1);
            async { Err("down".to_string()) }
        }));

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
