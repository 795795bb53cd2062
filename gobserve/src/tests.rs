use std::sync::{Arc, Mutex};
use std::time::Duration;

use gchat::{ChatService, ChatTurnRequest, ConversationStep, DialogueHooks};
use gcommon::SessionId;
use gcountry::{
    CountryError, CountryResolver, CountryStore, OfflineCountrySource, ResolverOperationHooks,
};

use crate::{
    MetricsObservabilityHooks, ObservabilityHooks, SafeDialogueHooks, SafeResolverHooks,
    TracingObservabilityHooks,
};

fn exercise_resolver_hooks(hooks: &dyn ResolverOperationHooks) {
    let error = CountryError::timeout("remote timeout");

    hooks.on_attempt_start("fetch_country", "spain", 1);
    hooks.on_retry_scheduled(
        "fetch_country",
        "spain",
        1,
        Duration::from_millis(10),
        &error,
    );
    hooks.on_success("fetch_country", "spain", 2);
    hooks.on_failure("fetch_country", "spain", 3, &error);
    hooks.on_fallback("fetch_country", "spain", &error);
    hooks.on_cache_hit("fetch_country", "spain");
}

fn exercise_dialogue_hooks(hooks: &dyn DialogueHooks) {
    let session_id = SessionId::from("session-1");

    hooks.on_turn_start(&session_id, &ConversationStep::Welcome);
    hooks.on_transition(
        &session_id,
        &ConversationStep::SelectCountry,
        &ConversationStep::ChooseOption,
    );
    hooks.on_fault(&session_id, "step handler panicked");
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_resolver_hooks(&TracingObservabilityHooks);
    exercise_dialogue_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_resolver_hooks(&MetricsObservabilityHooks);
    exercise_dialogue_hooks(&MetricsObservabilityHooks);
}

#[test]
fn combined_hooks_smoke_test_with_and_without_metrics() {
    let with_metrics = ObservabilityHooks::default();
    assert!(with_metrics.metrics_enabled());
    exercise_resolver_hooks(&with_metrics);
    exercise_dialogue_hooks(&with_metrics);

    let tracing_only = ObservabilityHooks::new(false);
    assert!(!tracing_only.metrics_enabled());
    exercise_resolver_hooks(&tracing_only);
    exercise_dialogue_hooks(&tracing_only);
}

#[derive(Default, Clone)]
struct RecordingResolverHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingResolverHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl ResolverOperationHooks for RecordingResolverHooks {
    fn on_attempt_start(&self, _operation: &str, _target: &str, _attempt: u32) {
        self.push("attempt_start");
    }

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _target: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &CountryError,
    ) {
        self.push("retry_scheduled");
    }

    fn on_success(&self, _operation: &str, _target: &str, _attempts: u32) {
        self.push("success");
    }

    fn on_failure(&self, _operation: &str, _target: &str, _attempts: u32, _error: &CountryError) {
        self.push("failure");
    }

    fn on_fallback(&self, _operation: &str, _target: &str, _error: &CountryError) {
        self.push("fallback");
    }

    fn on_cache_hit(&self, _operation: &str, _key: &str) {
        self.push("cache_hit");
    }
}

#[derive(Default, Clone)]
struct RecordingDialogueHooks {
    events: Arc<Mutex<Vec<String>>>,
}

impl DialogueHooks for RecordingDialogueHooks {
    fn on_turn_start(&self, _session_id: &SessionId, step: &ConversationStep) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("turn:{step}"));
    }

    fn on_transition(&self, _session_id: &SessionId, from: &ConversationStep, to: &ConversationStep) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{from}->{to}"));
    }

    fn on_fault(&self, _session_id: &SessionId, _message: &str) {
        self.events.lock().expect("events lock").push("fault".to_string());
    }
}

struct PanicResolverHooks;

impl ResolverOperationHooks for PanicResolverHooks {
    fn on_attempt_start(&self, _operation: &str, _target: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _target: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &CountryError,
    ) {
        panic!("retry_scheduled panic");
    }

    fn on_success(&self, _operation: &str, _target: &str, _attempts: u32) {
        panic!("success panic");
    }

    fn on_failure(&self, _operation: &str, _target: &str, _attempts: u32, _error: &CountryError) {
        panic!("failure panic");
    }

    fn on_fallback(&self, _operation: &str, _target: &str, _error: &CountryError) {
        panic!("fallback panic");
    }

    fn on_cache_hit(&self, _operation: &str, _key: &str) {
        panic!("cache_hit panic");
    }
}

struct PanicDialogueHooks;

impl DialogueHooks for PanicDialogueHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _step: &ConversationStep) {
        panic!("turn_start panic");
    }

    fn on_transition(&self, _session_id: &SessionId, _from: &ConversationStep, _to: &ConversationStep) {
        panic!("transition panic");
    }

    fn on_fault(&self, _session_id: &SessionId, _message: &str) {
        panic!("fault panic");
    }
}

#[test]
fn safe_resolver_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingResolverHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeResolverHooks::new(inner);

    exercise_resolver_hooks(&hooks);

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "attempt_start",
            "retry_scheduled",
            "success",
            "failure",
            "fallback",
            "cache_hit"
        ]
    );
}

#[test]
fn safe_dialogue_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingDialogueHooks::default();
    let events = Arc::clone(&inner.events);
    let hooks = SafeDialogueHooks::new(inner);

    exercise_dialogue_hooks(&hooks);

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "turn:WELCOME".to_string(),
            "SELECT_COUNTRY->CHOOSE_OPTION".to_string(),
            "fault".to_string()
        ]
    );
}

#[test]
fn safe_resolver_hooks_swallow_panics() {
    exercise_resolver_hooks(&SafeResolverHooks::new(PanicResolverHooks));
}

#[test]
fn safe_dialogue_hooks_swallow_panics() {
    exercise_dialogue_hooks(&SafeDialogueHooks::new(PanicDialogueHooks));
}

#[tokio::test]
async fn panicking_hooks_do_not_break_a_conversation() {
    let store = Arc::new(CountryStore::bundled().expect("bundled dataset"));
    let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), store)
        .hooks(Arc::new(SafeResolverHooks::new(PanicResolverHooks)))
        .build();
    let service = ChatService::builder(Arc::new(resolver))
        .hooks(Arc::new(SafeDialogueHooks::new(PanicDialogueHooks)))
        .build();

    service
        .run_turn(ChatTurnRequest::new("observed", "hello"))
        .await
        .expect("welcome turn");
    let turn = service
        .run_turn(ChatTurnRequest::new("observed", "Spain"))
        .await
        .expect("country turn");

    assert_eq!(turn.step, ConversationStep::ChooseOption);
    assert_eq!(turn.selected_country.as_deref(), Some("Spain"));
}
