//! Metrics-based observability hooks for resolver and dialogue phases.
//!
//! ```rust
//! use gobserve::MetricsObservabilityHooks;
//! use gcountry::ResolverOperationHooks;
//!
//! fn accepts_resolver_hooks(_hooks: &dyn ResolverOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_resolver_hooks(&hooks);
//! ```

use std::time::Duration;

use gchat::{ConversationStep, DialogueHooks};
use gcommon::SessionId;
use gcountry::{CountryError, ResolverOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ResolverOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, _target: &str, _attempt: u32) {
        metrics::counter!(
            "globetalk_resolver_attempt_start_total",
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        _target: &str,
        _attempt: u32,
        delay: Duration,
        error: &CountryError,
    ) {
        metrics::counter!(
            "globetalk_resolver_retry_scheduled_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "globetalk_resolver_retry_delay_seconds",
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, operation: &str, _target: &str, attempts: u32) {
        metrics::counter!(
            "globetalk_resolver_success_total",
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "globetalk_resolver_attempts_per_success",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, operation: &str, _target: &str, attempts: u32, error: &CountryError) {
        metrics::counter!(
            "globetalk_resolver_failure_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "globetalk_resolver_attempts_per_failure",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_fallback(&self, operation: &str, _target: &str, error: &CountryError) {
        metrics::counter!(
            "globetalk_resolver_fallback_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }

    fn on_cache_hit(&self, operation: &str, _key: &str) {
        metrics::counter!(
            "globetalk_resolver_cache_hit_total",
            "operation" => operation.to_string()
        )
        .increment(1);
    }
}

impl DialogueHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _session_id: &SessionId, step: &ConversationStep) {
        metrics::counter!("globetalk_dialogue_turn_total", "step" => step.to_string())
            .increment(1);
    }

    fn on_transition(&self, _session_id: &SessionId, from: &ConversationStep, to: &ConversationStep) {
        metrics::counter!(
            "globetalk_dialogue_transition_total",
            "from" => from.to_string(),
            "to" => to.to_string()
        )
        .increment(1);
    }

    fn on_fault(&self, _session_id: &SessionId, _message: &str) {
        metrics::counter!("globetalk_dialogue_fault_total").increment(1);
    }
}
