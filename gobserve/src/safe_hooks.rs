use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use gchat::{ConversationStep, DialogueHooks};
use gcommon::SessionId;
use gcountry::{CountryError, ResolverOperationHooks};

pub struct SafeResolverHooks<H> {
    inner: H,
}

impl<H> SafeResolverHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ResolverOperationHooks for SafeResolverHooks<H>
where
    H: ResolverOperationHooks,
{
    fn on_attempt_start(&self, operation: &str, target: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(operation, target, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        target: &str,
        attempt: u32,
        delay: Duration,
        error: &CountryError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(operation, target, attempt, delay, error)
        }));
    }

    fn on_success(&self, operation: &str, target: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(operation, target, attempts)
        }));
    }

    fn on_failure(&self, operation: &str, target: &str, attempts: u32, error: &CountryError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(operation, target, attempts, error)
        }));
    }

    fn on_fallback(&self, operation: &str, target: &str, error: &CountryError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_fallback(operation, target, error)
        }));
    }

    fn on_cache_hit(&self, operation: &str, key: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_cache_hit(operation, key)));
    }
}

pub struct SafeDialogueHooks<H> {
    inner: H,
}

impl<H> SafeDialogueHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> DialogueHooks for SafeDialogueHooks<H>
where
    H: DialogueHooks,
{
    fn on_turn_start(&self, session_id: &SessionId, step: &ConversationStep) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_start(session_id, step)
        }));
    }

    fn on_transition(&self, session_id: &SessionId, from: &ConversationStep, to: &ConversationStep) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_transition(session_id, from, to)
        }));
    }

    fn on_fault(&self, session_id: &SessionId, message: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_fault(session_id, message)
        }));
    }
}
