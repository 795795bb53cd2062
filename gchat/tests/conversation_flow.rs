use std::sync::{Arc, Mutex};
use std::time::Duration;

use gchat::prelude::*;
use gchat::render;
use gcountry::{
    CountryError, CountryRecord, CountryResolver, CountryStore, OfflineCountrySource, RetryPolicy,
    ScriptedCountrySource,
};

fn bundled() -> Arc<CountryStore> {
    Arc::new(CountryStore::bundled().expect("bundled dataset"))
}

#[derive(Default)]
struct TransitionRecorder {
    transitions: Mutex<Vec<String>>,
}

impl DialogueHooks for TransitionRecorder {
    fn on_transition(&self, _session_id: &SessionId, from: &ConversationStep, to: &ConversationStep) {
        self.transitions
            .lock()
            .expect("transitions lock")
            .push(format!("{from}->{to}"));
    }
}

#[tokio::test]
async fn hello_spain_capital_exit() {
    let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), bundled()).build();
    let hooks = Arc::new(TransitionRecorder::default());
    let service = ChatService::builder(Arc::new(resolver))
        .hooks(hooks.clone())
        .build();

    let mut replies = Vec::new();
    let mut last = None;
    for input in ["hello", "Spain", "A", "G"] {
        let turn = service
            .run_turn(ChatTurnRequest::new("tour", input))
            .await
            .expect("turn should succeed");
        replies.push(turn.reply.clone());
        last = Some(turn);
    }

    assert_eq!(replies[0], render::WELCOME_MESSAGE);
    assert_eq!(replies[1], render::selected("Spain"));
    assert_eq!(
        replies[2],
        format!(
            "The capital of Spain is Madrid.\n\n{}",
            render::option_menu("Spain")
        )
    );
    assert_eq!(replies[3], render::FAREWELL_MESSAGE);

    let last = last.expect("final turn");
    assert_eq!(last.step, ConversationStep::Exit);
    assert!(last.is_finished());

    assert_eq!(
        *hooks.transitions.lock().expect("transitions lock"),
        vec![
            "WELCOME->SELECT_COUNTRY".to_string(),
            "SELECT_COUNTRY->CHOOSE_OPTION".to_string(),
            "CHOOSE_OPTION->EXIT".to_string(),
        ]
    );
}

#[tokio::test]
async fn unknown_option_letter_keeps_menu_open() {
    let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), bundled()).build();
    let service = ChatService::builder(Arc::new(resolver)).build();

    for input in ["hi", "Kenya"] {
        service
            .run_turn(ChatTurnRequest::new("z", input))
            .await
            .expect("turn");
    }

    let turn = service
        .run_turn(ChatTurnRequest::new("z", "Z"))
        .await
        .expect("turn");

    assert_eq!(
        turn.reply,
        format!(
            "Invalid option. Please select one of the options (A-G).\n\n{}",
            render::option_menu("Kenya")
        )
    );
    assert_eq!(turn.step, ConversationStep::ChooseOption);
}

#[tokio::test]
async fn remote_record_survives_transient_failures() {
    let mut remote = CountryRecord::new("Spain")
        .with_capital("Madrid")
        .with_population(48_592_909)
        .with_area(505_992.0);
    remote.region = Some("Europe".to_string());
    let source = Arc::new(
        ScriptedCountrySource::new(vec![
            Err(CountryError::timeout("slow")),
            Err(CountryError::unavailable("busy")),
            Ok(remote),
        ])
        .with_names(Ok(vec!["Spain".to_string(), "Sweden".to_string()])),
    );
    let resolver = CountryResolver::builder(source, bundled())
        .retry_policy(RetryPolicy::new(3).with_initial_backoff(Duration::from_millis(1)))
        .build();
    let service = ChatService::builder(Arc::new(resolver)).build();

    for input in ["hello", "sp", "detailed"] {
        service
            .run_turn(ChatTurnRequest::new("remote", input))
            .await
            .expect("turn");
    }

    let turn = service
        .run_turn(ChatTurnRequest::new("remote", "E"))
        .await
        .expect("turn");

    assert!(turn.detailed_mode);
    assert!(turn.reply.contains("Population: 48.6M\n"));
    assert!(turn.reply.contains("National Animal: Bull\n"));
    assert!(turn.reply.contains("National Bird: Spanish Imperial Eagle\n"));
}

#[tokio::test]
async fn sessions_do_not_share_state() {
    let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), bundled()).build();
    let service = ChatService::builder(Arc::new(resolver)).build();

    for (session, input) in [("a", "hello"), ("b", "hello"), ("a", "Chile"), ("b", "Japan")] {
        service
            .run_turn(ChatTurnRequest::new(session, input))
            .await
            .expect("turn");
    }

    let a = service
        .run_turn(ChatTurnRequest::new("a", "A"))
        .await
        .expect("turn");
    let b = service
        .run_turn(ChatTurnRequest::new("b", "A"))
        .await
        .expect("turn");

    assert!(a.reply.starts_with("The capital of Chile is Santiago."));
    assert!(b.reply.starts_with("The capital of Japan is Tokyo."));
    assert_eq!(service.active_sessions(), 2);
}
