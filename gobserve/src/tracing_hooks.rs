//! Tracing-based observability hooks for resolver and dialogue phases.
//!
//! ```rust
//! use gobserve::TracingObservabilityHooks;
//! use gchat::DialogueHooks;
//!
//! fn accepts_dialogue_hooks(_hooks: &dyn DialogueHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_dialogue_hooks(&hooks);
//! ```

use std::time::Duration;

use gchat::{ConversationStep, DialogueHooks};
use gcommon::SessionId;
use gcountry::{CountryError, ResolverOperationHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ResolverOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, target: &str, attempt: u32) {
        tracing::debug!(
            phase = "resolver",
            event = "attempt_start",
            operation,
            target,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        target: &str,
        attempt: u32,
        delay: Duration,
        error: &CountryError,
    ) {
        tracing::warn!(
            phase = "resolver",
            event = "retry_scheduled",
            operation,
            target,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, operation: &str, target: &str, attempts: u32) {
        tracing::info!(
            phase = "resolver",
            event = "success",
            operation,
            target,
            attempts
        );
    }

    fn on_failure(&self, operation: &str, target: &str, attempts: u32, error: &CountryError) {
        tracing::error!(
            phase = "resolver",
            event = "failure",
            operation,
            target,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_fallback(&self, operation: &str, target: &str, error: &CountryError) {
        tracing::warn!(
            phase = "resolver",
            event = "fallback",
            operation,
            target,
            error_kind = ?error.kind,
            error = %error,
            "remote lookup failed, using local dataset"
        );
    }

    fn on_cache_hit(&self, operation: &str, key: &str) {
        tracing::debug!(phase = "resolver", event = "cache_hit", operation, key);
    }
}

impl DialogueHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId, step: &ConversationStep) {
        tracing::debug!(
            phase = "dialogue",
            event = "turn_start",
            session_id = %session_id,
            step = %step
        );
    }

    fn on_transition(&self, session_id: &SessionId, from: &ConversationStep, to: &ConversationStep) {
        tracing::info!(
            phase = "dialogue",
            event = "transition",
            session_id = %session_id,
            from = %from,
            to = %to
        );
    }

    fn on_fault(&self, session_id: &SessionId, message: &str) {
        tracing::error!(
            phase = "dialogue",
            event = "fault",
            session_id = %session_id,
            message
        );
    }
}
