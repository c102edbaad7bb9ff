//! Bounded retry for connecting and for test setup.
//!
//! Connecting to a store that is still starting up is retried a fixed number
//! of times with a fixed delay; the last error is returned once the attempts
//! run out.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::StoreResult,
};

/// How often and how patiently to retry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy { max_attempts, delay_ms: delay.as_millis() as u64 }
    }

    /// A single attempt with no retry.
    pub fn once() -> Self {
        RetryPolicy { max_attempts: 1, delay_ms: 0 }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 100, delay_ms: 250 }
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are used up.
///
/// The closure receives the one-based attempt number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> StoreResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(label, attempt, "succeeded after retrying");
                }
                return Ok(value);
            }
            Err(err) if attempt >= max_attempts => {
                warn!(label, attempt, error = %err, "giving up");
                return Err(err);
            }
            Err(err) => {
                debug!(label, attempt, error = %err, "attempt failed, retrying");
                tokio::time::sleep(policy.delay()).await;
                attempt += 1;
            }
        }
    }
}

/// Builds a backend, retrying failed connection attempts.
pub async fn connect<C>(builder: C, policy: &RetryPolicy) -> StoreResult<C::Backend>
where
    C: StoreBackendBuilder + Clone,
{
    retry(policy, "connect", |_| builder.clone().build()).await
}

/// Drops `collection`, retrying failures. Meant for test and setup tooling.
pub async fn clear_collection<B>(backend: &B, collection: &str, policy: &RetryPolicy) -> StoreResult<()>
where
    B: StoreBackend,
{
    retry(policy, "drop collection", |_| backend.drop_collection(collection)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, delay_ms: 1 }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry(&quick(5), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(StoreError::Connection("not yet".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result: StoreResult<()> = retry(&quick(4), "test", move |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Err(StoreError::Connection(format!("attempt {attempt}"))) }
        })
        .await;
        assert!(matches!(result, Err(StoreError::Connection(m)) if m == "attempt 4"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _ = retry(&quick(0), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(StoreError::Backend("x".into())) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 100);
        assert_eq!(policy.delay(), Duration::from_millis(250));
    }
}
