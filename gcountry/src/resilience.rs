//! Retry/backoff policy and resolver operation hook contracts.

use std::future::Future;
use std::time::Duration;

use crate::CountryError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// A policy that performs one attempt and never sleeps.
    pub fn no_retry() -> Self {
        Self::new(1).with_initial_backoff(Duration::ZERO)
    }

    pub fn should_retry(&self, attempt: u32, error: &CountryError) -> bool {
        error.retryable && attempt < self.max_attempts
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = (attempt.saturating_sub(1)) as i32;
        let unbounded = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_backoff.as_secs_f64()))
    }
}

/// Observation points around remote lookups. `operation` is one of
/// `fetch_country` or `list_country_names`; `target` is the requested name
/// or `*` for the full list.
pub trait ResolverOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _operation: &str, _target: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _target: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &CountryError,
    ) {
    }

    fn on_success(&self, _operation: &str, _target: &str, _attempts: u32) {}

    fn on_failure(&self, _operation: &str, _target: &str, _attempts: u32, _error: &CountryError) {}

    /// The remote path gave up and the local dataset is consulted instead.
    fn on_fallback(&self, _operation: &str, _target: &str, _error: &CountryError) {}

    fn on_cache_hit(&self, _operation: &str, _key: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolverHooks;

impl ResolverOperationHooks for NoopResolverHooks {}

pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    operation: &str,
    target: &str,
    policy: &RetryPolicy,
    hooks: &dyn ResolverOperationHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> Result<T, CountryError>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, CountryError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = ()>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(operation, target, attempt);

        match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(operation, target, attempt);
                return Ok(value);
            }
            Err(error) => {
                if policy.should_retry(attempt, &error) {
                    let delay = policy.backoff_for_attempt(attempt);
                    tracing::debug!(
                        operation,
                        target,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying country lookup"
                    );
                    hooks.on_retry_scheduled(operation, target, attempt, delay, &error);
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                hooks.on_failure(operation, target, attempt, &error);
                return Err(error);
            }
        }
    }
}
