//! Bounded exponential backoff for remote calls
//!
//! Every remote call made during a pass goes through one [`RetryPolicy`]
//! via [`RetryingRemote`], so call sites never carry their own retry loops.

use std::time::Duration;

use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, warn};

use super::{
    CreatedDocument, RemoteAccessor, RemoteError, RemoteMetadata, RemoteResult, RemoteRevision,
};

/// Retry settings for transient remote failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// A fast policy for tests: same attempt bound, millisecond sleeps.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            multiplier: 1.0,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(self.multiplier)
            .with_max_elapsed_time(None)
            .build()
    }

    /// Run `op`, retrying transient failures until `max_attempts` is reached.
    ///
    /// Non-transient errors are returned immediately. When attempts run out
    /// the last transient error is returned as-is.
    pub fn run<T>(
        &self,
        operation: &str,
        mut op: impl FnMut() -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let max_attempts = self.max_attempts.max(1);
        let max_interval = self.max_interval;
        let mut attempts = 0u32;

        let outcome = backoff::retry(self.backoff(), || {
            attempts += 1;
            match op() {
                Ok(value) => Ok(value),
                Err(err) if err.is_transient() && attempts < max_attempts => {
                    warn!(operation, attempt = attempts, error = %err, "Transient remote failure, retrying");
                    let retry_after = match &err {
                        RemoteError::RateLimited {
                            retry_after: Some(wait),
                        } => Some((*wait).min(max_interval)),
                        _ => None,
                    };
                    Err(backoff::Error::Transient { err, retry_after })
                }
                Err(err) => Err(backoff::Error::Permanent(err)),
            }
        });

        outcome.map_err(|e| {
            let err = match e {
                backoff::Error::Permanent(err) => err,
                backoff::Error::Transient { err, .. } => err,
            };
            if err.is_transient() {
                warn!(operation, attempts, error = %err, "Remote call failed after retries");
            } else {
                debug!(operation, error = %err, "Remote call failed");
            }
            err
        })
    }
}

/// Wraps an accessor so every call goes through a [`RetryPolicy`].
pub struct RetryingRemote<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R: RemoteAccessor> RetryingRemote<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<R: RemoteAccessor> RemoteAccessor for RetryingRemote<R> {
    fn get_metadata(&self, id: &str) -> RemoteResult<RemoteMetadata> {
        self.policy.run("get_metadata", || self.inner.get_metadata(id))
    }

    fn create(&self, title: &str, folder_id: Option<&str>) -> RemoteResult<CreatedDocument> {
        self.policy.run("create", || self.inner.create(title, folder_id))
    }

    fn replace_content(&self, id: &str, text: &str) -> RemoteResult<RemoteRevision> {
        self.policy
            .run("replace_content", || self.inner.replace_content(id, text))
    }

    fn export_as_text(&self, id: &str) -> RemoteResult<String> {
        self.policy.run("export_as_text", || self.inner.export_as_text(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_first_success() {
        let policy = RetryPolicy::immediate(3);
        let mut calls = 0;
        let result = policy.run("op", || {
            calls += 1;
            Ok::<_, RemoteError>(7)
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_transient_until_success() {
        let policy = RetryPolicy::immediate(5);
        let mut calls = 0;
        let result = policy.run("op", || {
            calls += 1;
            if calls < 3 {
                Err(RemoteError::Server {
                    status: 503,
                    message: "busy".into(),
                })
            } else {
                Ok("done")
            }
        });
        assert_eq!(result, Ok("done"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::immediate(4);
        let mut calls = 0;
        let result: RemoteResult<()> = policy.run("op", || {
            calls += 1;
            Err(RemoteError::RateLimited {
                retry_after: Some(Duration::from_secs(60)),
            })
        });
        assert!(matches!(result, Err(RemoteError::RateLimited { .. })));
        assert_eq!(calls, 4);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let policy = RetryPolicy::immediate(5);
        let mut calls = 0;
        let result: RemoteResult<()> = policy.run("op", || {
            calls += 1;
            Err(RemoteError::NotFound { id: "doc".into() })
        });
        assert_eq!(result, Err(RemoteError::NotFound { id: "doc".into() }));
        assert_eq!(calls, 1);
    }

    #[test]
    fn none_policy_makes_single_attempt() {
        let policy = RetryPolicy::none();
        let mut calls = 0;
        let _: RemoteResult<()> = policy.run("op", || {
            calls += 1;
            Err(RemoteError::Transport {
                message: "reset".into(),
            })
        });
        assert_eq!(calls, 1);
    }
}
