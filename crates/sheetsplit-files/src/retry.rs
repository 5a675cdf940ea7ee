//! Fixed-delay retry.
//!
//! An operation is attempted up to `max_retries` times, sleeping a fixed
//! delay between attempts but never after the last one. Every failure is
//! logged. The outcome is returned, never raised.

use crate::error::SplitError;
use std::thread;
use std::time::Duration;
use tracing::{error, warn};

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (0 behaves like 1)
    pub max_retries: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Whether a failed attempt is worth repeating
pub trait Retryable {
    /// `false` stops the retry loop immediately
    fn is_retryable(&self) -> bool;
}

impl Retryable for SplitError {
    fn is_retryable(&self) -> bool {
        SplitError::is_retryable(self)
    }
}

/// Outcome of a retried operation
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded
    Succeeded {
        /// Value returned by the successful attempt
        value: T,
        /// Attempts made, including the successful one
        attempts: u32,
    },
    /// Every attempt failed with a retryable error
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// Error from the final attempt
        last_error: E,
    },
    /// An attempt failed with an error that is not retryable
    Aborted {
        /// Attempts made, including the aborting one
        attempts: u32,
        /// Terminal error
        error: E,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Whether an attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Collapse into a `Result`, keeping the attempt count
    ///
    /// # Errors
    ///
    /// Returns the last or terminal error when no attempt succeeded.
    pub fn into_result(self) -> Result<(T, u32), (E, u32)> {
        match self {
            Self::Succeeded { value, attempts } => Ok((value, attempts)),
            Self::Exhausted {
                attempts,
                last_error,
            } => Err((last_error, attempts)),
            Self::Aborted { attempts, error } => Err((error, attempts)),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    #[must_use]
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Attempts that will actually be made
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Run `op`, sleeping with [`thread::sleep`] between attempts
    pub fn run<T, E, F>(&self, op: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        E: Retryable + std::fmt::Display,
    {
        self.run_with_sleep(op, thread::sleep)
    }

    /// Run `op` with a custom sleep function.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run_with_sleep<T, E, F, S>(&self, mut op: F, mut sleep: S) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        S: FnMut(Duration),
        E: Retryable + std::fmt::Display,
    {
        let total = self.attempts();
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    };
                }
                Err(e) if !e.is_retryable() => {
                    error!("Attempt {} failed with non-retryable error: {}", attempt, e);
                    return RetryOutcome::Aborted {
                        attempts: attempt,
                        error: e,
                    };
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    if attempt >= total {
                        error!("All {} attempts failed.", total);
                        return RetryOutcome::Exhausted {
                            attempts: attempt,
                            last_error: e,
                        };
                    }
                }
            }

            sleep(self.delay);
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn transient() -> SplitError {
        SplitError::Io(io::Error::new(io::ErrorKind::WouldBlock, "file locked"))
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(250))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_first_attempt_success_does_not_sleep() {
        let mut sleeps = Vec::new();
        let outcome: RetryOutcome<u32, SplitError> =
            policy(3).run_with_sleep(|_| Ok(7), |d| sleeps.push(d));

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 1);
        assert!(sleeps.is_empty());
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let mut sleeps = Vec::new();
        let outcome = policy(4).run_with_sleep(
            |attempt| if attempt < 3 { Err(transient()) } else { Ok(attempt) },
            |d| sleeps.push(d),
        );

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                assert_eq!(value, 3);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(sleeps.len(), 2);
    }

    #[test]
    fn test_always_failing_sleeps_between_not_after() {
        let mut calls = 0;
        let mut sleeps = Vec::new();
        let outcome: RetryOutcome<(), SplitError> = policy(3).run_with_sleep(
            |_| {
                calls += 1;
                Err(transient())
            },
            |d| sleeps.push(d),
        );

        assert_eq!(calls, 3);
        assert_eq!(sleeps, vec![Duration::from_millis(250); 2]);
        assert!(matches!(
            outcome,
            RetryOutcome::Exhausted { attempts: 3, .. }
        ));
    }

    #[test]
    fn test_non_retryable_aborts_immediately() {
        let mut calls = 0;
        let mut sleeps = Vec::new();
        let outcome: RetryOutcome<(), SplitError> = policy(5).run_with_sleep(
            |_| {
                calls += 1;
                Err(SplitError::UnsupportedFileType {
                    extension: "txt".into(),
                })
            },
            |d| sleeps.push(d),
        );

        assert_eq!(calls, 1);
        assert!(sleeps.is_empty());
        assert!(matches!(outcome, RetryOutcome::Aborted { attempts: 1, .. }));
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let mut calls = 0;
        let outcome: RetryOutcome<(), SplitError> = policy(0).run_with_sleep(
            |_| {
                calls += 1;
                Err(transient())
            },
            |_| panic!("must not sleep"),
        );

        assert_eq!(calls, 1);
        assert_eq!(outcome.attempts(), 1);
    }

    #[test]
    fn test_into_result() {
        let ok: RetryOutcome<u8, SplitError> = RetryOutcome::Succeeded {
            value: 1,
            attempts: 2,
        };
        assert_eq!(ok.into_result().unwrap(), (1, 2));

        let exhausted: RetryOutcome<u8, SplitError> = RetryOutcome::Exhausted {
            attempts: 3,
            last_error: transient(),
        };
        let (err, attempts) = exhausted.into_result().unwrap_err();
        assert_eq!(attempts, 3);
        assert!(err.is_retryable());
    }
}
