use std::time::Duration;

use gchat::{ConversationStep, DialogueHooks};
use gcommon::SessionId;
use gcountry::{CountryError, ResolverOperationHooks};

use crate::{MetricsObservabilityHooks, TracingObservabilityHooks};

/// Emits every event as a tracing record and, when `metrics` is on, as a
/// metric as well.
#[derive(Debug, Clone, Copy)]
pub struct ObservabilityHooks {
    tracing: TracingObservabilityHooks,
    metrics: Option<MetricsObservabilityHooks>,
}

impl ObservabilityHooks {
    pub fn new(metrics_enabled: bool) -> Self {
        Self {
            tracing: TracingObservabilityHooks,
            metrics: metrics_enabled.then_some(MetricsObservabilityHooks),
        }
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics.is_some()
    }
}

impl Default for ObservabilityHooks {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResolverOperationHooks for ObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, target: &str, attempt: u32) {
        self.tracing.on_attempt_start(operation, target, attempt);
        if let Some(metrics) = &self.metrics {
            metrics.on_attempt_start(operation, target, attempt);
        }
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        target: &str,
        attempt: u32,
        delay: Duration,
        error: &CountryError,
    ) {
        self.tracing
            .on_retry_scheduled(operation, target, attempt, delay, error);
        if let Some(metrics) = &self.metrics {
            metrics.on_retry_scheduled(operation, target, attempt, delay, error);
        }
    }

    fn on_success(&self, operation: &str, target: &str, attempts: u32) {
        self.tracing.on_success(operation, target, attempts);
        if let Some(metrics) = &self.metrics {
            metrics.on_success(operation, target, attempts);
        }
    }

    fn on_failure(&self, operation: &str, target: &str, attempts: u32, error: &CountryError) {
        self.tracing.on_failure(operation, target, attempts, error);
        if let Some(metrics) = &self.metrics {
            metrics.on_failure(operation, target, attempts, error);
        }
    }

    fn on_fallback(&self, operation: &str, target: &str, error: &CountryError) {
        self.tracing.on_fallback(operation, target, error);
        if let Some(metrics) = &self.metrics {
            metrics.on_fallback(operation, target, error);
        }
    }

    fn on_cache_hit(&self, operation: &str, key: &str) {
        self.tracing.on_cache_hit(operation, key);
        if let Some(metrics) = &self.metrics {
            metrics.on_cache_hit(operation, key);
        }
    }
}

impl DialogueHooks for ObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId, step: &ConversationStep) {
        self.tracing.on_turn_start(session_id, step);
        if let Some(metrics) = &self.metrics {
            metrics.on_turn_start(session_id, step);
        }
    }

    fn on_transition(&self, session_id: &SessionId, from: &ConversationStep, to: &ConversationStep) {
        self.tracing.on_transition(session_id, from, to);
        if let Some(metrics) = &self.metrics {
            metrics.on_transition(session_id, from, to);
        }
    }

    fn on_fault(&self, session_id: &SessionId, message: &str) {
        self.tracing.on_fault(session_id, message);
        if let Some(metrics) = &self.metrics {
            metrics.on_fault(session_id, message);
        }
    }
}
