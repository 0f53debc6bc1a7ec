use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use log::{error, warn};

/// Fixed-delay retry: `attempts` tries in total, `delay` between them.
///
/// The delay is an awaited timer, so dropping the returned future cancels
/// both the pending request and any remaining retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds, fails with an error that
    /// `should_retry` rejects, or runs out of attempts.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        label: &str,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if should_retry(&err) && attempt < attempts => {
                    warn!(
                        "{} attempt {}/{} failed ({}), retrying in {:?}",
                        label, attempt, attempts, err, self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if should_retry(&err) {
                        error!("{} failed after {} attempts: {}", label, attempt, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Timeout,
        Fatal,
    }

    impl Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn is_timeout(failure: &Failure) -> bool {
        *failure == Failure::Timeout
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_timeouts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let started = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(
                "report",
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::Timeout)
                },
                is_timeout,
            )
            .await;

        assert_eq!(result, Err(Failure::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_a_later_attempt() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = RetryPolicy::default()
            .run(
                "report",
                || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Failure::Timeout)
                    } else {
                        Ok("<p>report</p>")
                    }
                },
                is_timeout,
            )
            .await;

        assert_eq!(result, Ok("<p>report</p>"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_other_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = RetryPolicy::default()
            .run(
                "report",
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Failure::Fatal)
                },
                is_timeout,
            )
            .await;

        assert_eq!(result, Err(Failure::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
