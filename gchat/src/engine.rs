//! Rule-based dialogue step machine.
//!
//! Every call to [`DialogueEngine::process`] yields a reply and leaves the
//! state valid. Panics raised while handling a step are caught, reported,
//! and turned into an apology plus a reset to country selection.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use gcountry::{CountryLookup, CountryProperty};

use crate::render;
use crate::{ConversationState, ConversationStep, DialogueHooks, NoopDialogueHooks};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Capital,
    NationalAnimal,
    NationalFlower,
    PopulationAndArea,
    AllInformation,
    ChooseAnother,
    Exit,
}

impl MenuOption {
    /// Accepts a single letter A-G in either case.
    pub fn parse(input: &str) -> Option<Self> {
        let mut chars = input.chars();
        let (Some(letter), None) = (chars.next(), chars.next()) else {
            return None;
        };

        match letter.to_ascii_uppercase() {
            'A' => Some(Self::Capital),
            'B' => Some(Self::NationalAnimal),
            'C' => Some(Self::NationalFlower),
            'D' => Some(Self::PopulationAndArea),
            'E' => Some(Self::AllInformation),
            'F' => Some(Self::ChooseAnother),
            'G' => Some(Self::Exit),
            _ => None,
        }
    }
}

pub struct DialogueEngine {
    lookup: Arc<dyn CountryLookup>,
    hooks: Arc<dyn DialogueHooks>,
}

impl DialogueEngine {
    pub fn new(lookup: Arc<dyn CountryLookup>) -> Self {
        Self {
            lookup,
            hooks: Arc::new(NoopDialogueHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn DialogueHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub async fn process(&self, input: &str, state: &mut ConversationState) -> String {
        state.record_input(input);
        let from = state.current_step.clone();
        self.hooks.on_turn_start(&state.session_id, &from);

        let message = input.trim();
        let reply = if from == ConversationStep::Welcome {
            state.current_step = ConversationStep::SelectCountry;
            render::WELCOME_MESSAGE.to_string()
        } else if let Some(reply) = global_command(message, state) {
            reply
        } else {
            let outcome = AssertUnwindSafe(self.dispatch(message, state))
                .catch_unwind()
                .await;
            match outcome {
                Ok(reply) => reply,
                Err(panic) => {
                    let detail = panic_detail(&*panic);
                    tracing::error!(
                        session_id = %state.session_id,
                        step = %state.current_step,
                        error = %detail,
                        "dialogue step failed, resetting conversation"
                    );
                    self.hooks.on_fault(&state.session_id, &detail);
                    state.return_to_selection();
                    render::ENGINE_FAULT_MESSAGE.to_string()
                }
            }
        };

        if state.current_step != from {
            self.hooks
                .on_transition(&state.session_id, &from, &state.current_step);
        }
        reply
    }

    async fn dispatch(&self, message: &str, state: &mut ConversationState) -> String {
        match (state.current_step.clone(), state.selected_country.clone()) {
            (ConversationStep::SelectCountry, _) => self.select_country(message, state).await,
            (ConversationStep::ChooseOption, Some(country)) => {
                self.choose_option(message, &country, state).await
            }
            (step, _) => {
                tracing::warn!(
                    session_id = %state.session_id,
                    step = %step,
                    selected_country = ?state.selected_country,
                    "unexpected conversation step"
                );
                state.return_to_selection();
                render::START_OVER_MESSAGE.to_string()
            }
        }
    }

    async fn select_country(&self, message: &str, state: &mut ConversationState) -> String {
        let matches = self.lookup.list_by_prefix(message).await;
        match matches.as_slice() {
            [] => render::no_match(message),
            [country] => {
                state.select_country(country.clone());
                render::selected(country)
            }
            _ => render::multiple_matches(&matches),
        }
    }

    async fn choose_option(
        &self,
        message: &str,
        country: &str,
        state: &mut ConversationState,
    ) -> String {
        let Some(option) = MenuOption::parse(message) else {
            return render::invalid_option(country);
        };

        let answer = match option {
            MenuOption::Capital => format!(
                "The capital of {country} is {}.",
                self.property(country, CountryProperty::Capital).await
            ),
            MenuOption::NationalAnimal => format!(
                "The national animal of {country} is {}.",
                self.property(country, CountryProperty::NationalAnimal).await
            ),
            MenuOption::NationalFlower => format!(
                "The national flower of {country} is {}.",
                self.property(country, CountryProperty::NationalFlower).await
            ),
            MenuOption::PopulationAndArea => format!(
                "Population: {}\nArea: {}",
                self.property(country, CountryProperty::Population).await,
                self.property(country, CountryProperty::Area).await
            ),
            MenuOption::AllInformation => {
                let record = self.lookup.resolve(country).await;
                render::country_report(record.as_ref(), state.detailed_mode)
            }
            MenuOption::ChooseAnother => {
                state.return_to_selection();
                return render::NEW_COUNTRY_MESSAGE.to_string();
            }
            MenuOption::Exit => {
                state.finish();
                return render::FAREWELL_MESSAGE.to_string();
            }
        };

        render::with_menu(&answer, country)
    }

    async fn property(&self, country: &str, property: CountryProperty) -> String {
        self.lookup.get_property(country, property.key()).await
    }
}

fn global_command(message: &str, state: &mut ConversationState) -> Option<String> {
    if message.eq_ignore_ascii_case("help") {
        Some(render::help(state))
    } else if message.eq_ignore_ascii_case("detailed") {
        state.detailed_mode = true;
        Some(render::DETAILED_MODE_MESSAGE.to_string())
    } else if message.eq_ignore_ascii_case("simple") {
        state.detailed_mode = false;
        Some(render::SIMPLE_MODE_MESSAGE.to_string())
    } else {
        None
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use gcommon::BoxFuture;
    use gcountry::{CountryRecord, PROPERTY_NOT_AVAILABLE};

    use super::*;

    /// Lookup over a fixed set of records; records every prefix query.
    #[derive(Default)]
    struct FakeLookup {
        records: Vec<CountryRecord>,
        prefixes: Mutex<Vec<String>>,
    }

    impl FakeLookup {
        fn with(records: Vec<CountryRecord>) -> Self {
            Self {
                records,
                prefixes: Mutex::new(Vec::new()),
            }
        }

        fn find(&self, name: &str) -> Option<CountryRecord> {
            self.records
                .iter()
                .find(|record| record.name == name.trim().to_lowercase())
                .cloned()
        }
    }

    impl CountryLookup for FakeLookup {
        fn resolve<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<CountryRecord>> {
            Box::pin(async move { self.find(name) })
        }

        fn list_by_prefix<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Vec<String>> {
            Box::pin(async move {
                self.prefixes
                    .lock()
                    .expect("prefixes lock")
                    .push(prefix.to_string());
                let prefix = prefix.trim().to_lowercase();
                self.records
                    .iter()
                    .filter(|record| record.name.starts_with(&prefix))
                    .map(|record| record.common_name.clone())
                    .collect()
            })
        }

        fn list_all<'a>(&'a self) -> BoxFuture<'a, Vec<String>> {
            Box::pin(async move {
                self.records
                    .iter()
                    .map(|record| record.common_name.clone())
                    .collect()
            })
        }

        fn get_property<'a>(&'a self, name: &'a str, key: &'a str) -> BoxFuture<'a, String> {
            Box::pin(async move {
                match (self.find(name), CountryProperty::parse(key)) {
                    (Some(record), Some(property)) => record.property(property),
                    (Some(_), None) => PROPERTY_NOT_AVAILABLE.to_string(),
                    (None, _) => "Country not found".to_string(),
                }
            })
        }
    }

    struct PanickingLookup;

    fn explode<T>() -> T {
        panic!("resolver exploded")
    }

    impl CountryLookup for PanickingLookup {
        fn resolve<'a>(&'a self, _name: &'a str) -> BoxFuture<'a, Option<CountryRecord>> {
            Box::pin(async { explode::<Option<CountryRecord>>() })
        }

        fn list_by_prefix<'a>(&'a self, _prefix: &'a str) -> BoxFuture<'a, Vec<String>> {
            Box::pin(async { explode::<Vec<String>>() })
        }

        fn list_all<'a>(&'a self) -> BoxFuture<'a, Vec<String>> {
            Box::pin(async { Vec::new() })
        }

        fn get_property<'a>(&'a self, _name: &'a str, _key: &'a str) -> BoxFuture<'a, String> {
            Box::pin(async { explode::<String>() })
        }
    }

    fn engine() -> DialogueEngine {
        let mut spain = CountryRecord::new("Spain")
            .with_capital("Madrid")
            .with_population(47_351_567)
            .with_area(505_992.0);
        spain.national_animal = "Bull".to_string();
        spain.national_flower = "Red Carnation".to_string();

        DialogueEngine::new(Arc::new(FakeLookup::with(vec![
            spain,
            CountryRecord::new("Niger").with_capital("Niamey"),
            CountryRecord::new("Nigeria").with_capital("Abuja"),
        ])))
    }

    async fn started(engine: &DialogueEngine) -> ConversationState {
        let mut state = ConversationState::new("s1");
        engine.process("hello", &mut state).await;
        state
    }

    #[test]
    fn menu_options_parse_single_letters_only() {
        assert_eq!(MenuOption::parse("a"), Some(MenuOption::Capital));
        assert_eq!(MenuOption::parse("G"), Some(MenuOption::Exit));
        assert_eq!(MenuOption::parse("Z"), None);
        assert_eq!(MenuOption::parse("AB"), None);
        assert_eq!(MenuOption::parse(""), None);
    }

    #[tokio::test]
    async fn first_message_always_welcomes() {
        let engine = engine();
        for first in ["hello", "help", "detailed", "Spain"] {
            let mut state = ConversationState::new("s1");
            let reply = engine.process(first, &mut state).await;
            assert_eq!(reply, render::WELCOME_MESSAGE);
            assert_eq!(state.current_step, ConversationStep::SelectCountry);
            assert!(!state.detailed_mode);
        }
    }

    #[tokio::test]
    async fn unique_prefix_selects_country() {
        let engine = engine();
        let mut state = started(&engine).await;

        let reply = engine.process("  sp ", &mut state).await;

        assert_eq!(reply, render::selected("Spain"));
        assert_eq!(state.current_step, ConversationStep::ChooseOption);
        assert_eq!(state.selected_country.as_deref(), Some("Spain"));
        assert_eq!(state.last_query.as_deref(), Some("  sp "));
        assert_eq!(state.interaction_count, 2);
    }

    #[tokio::test]
    async fn zero_or_many_matches_stay_in_selection() {
        let engine = engine();
        let mut state = started(&engine).await;

        let none = engine.process("Atlantis", &mut state).await;
        assert_eq!(
            none,
            "No country found matching 'Atlantis'.\nPlease enter a valid country name."
        );
        assert_eq!(state.current_step, ConversationStep::SelectCountry);

        let many = engine.process("Niger", &mut state).await;
        assert_eq!(
            many,
            "Multiple matches found: Niger, Nigeria.\nPlease be more specific."
        );
        assert_eq!(state.current_step, ConversationStep::SelectCountry);
        assert_eq!(state.selected_country, None);
    }

    #[tokio::test]
    async fn options_answer_and_reshow_menu() {
        let engine = engine();
        let mut state = started(&engine).await;
        engine.process("Spain", &mut state).await;

        let capital = engine.process("a", &mut state).await;
        assert_eq!(capital, render::with_menu("The capital of Spain is Madrid.", "Spain"));

        let animal = engine.process("B", &mut state).await;
        assert!(animal.starts_with("The national animal of Spain is Bull.\n\n"));

        let flower = engine.process("C", &mut state).await;
        assert!(flower.starts_with("The national flower of Spain is Red Carnation.\n\n"));

        let numbers = engine.process("D", &mut state).await;
        assert!(numbers.starts_with("Population: 47.4M\nArea: 505,992 km²\n\n"));

        let report = engine.process("E", &mut state).await;
        assert!(report.starts_with("Information about Spain:\n\nCapital: Madrid\n"));
        assert!(report.ends_with(&render::option_menu("Spain")));
        assert_eq!(state.current_step, ConversationStep::ChooseOption);
    }

    #[tokio::test]
    async fn invalid_option_keeps_step() {
        let engine = engine();
        let mut state = started(&engine).await;
        engine.process("Spain", &mut state).await;

        let reply = engine.process("Z", &mut state).await;

        assert_eq!(reply, render::invalid_option("Spain"));
        assert_eq!(state.current_step, ConversationStep::ChooseOption);
    }

    #[tokio::test]
    async fn choose_another_clears_selection() {
        let engine = engine();
        let mut state = started(&engine).await;
        engine.process("Spain", &mut state).await;

        let reply = engine.process("f", &mut state).await;

        assert_eq!(reply, render::NEW_COUNTRY_MESSAGE);
        assert_eq!(state.current_step, ConversationStep::SelectCountry);
        assert_eq!(state.selected_country, None);
    }

    #[tokio::test]
    async fn detailed_toggle_is_idempotent_and_keeps_step() {
        let engine = engine();
        let mut state = started(&engine).await;
        engine.process("Spain", &mut state).await;

        for _ in 0..2 {
            let reply = engine.process("DETAILED", &mut state).await;
            assert_eq!(reply, render::DETAILED_MODE_MESSAGE);
            assert!(state.detailed_mode);
            assert_eq!(state.current_step, ConversationStep::ChooseOption);
        }

        let report = engine.process("E", &mut state).await;
        assert!(report.contains("Population: 47.4M\n"));

        engine.process("simple", &mut state).await;
        assert!(!state.detailed_mode);
    }

    #[tokio::test]
    async fn help_does_not_change_state() {
        let engine = engine();
        let mut state = started(&engine).await;
        engine.process("Spain", &mut state).await;
        let before = state.clone();

        let reply = engine.process("Help", &mut state).await;

        assert!(reply.starts_with("Please select an option (A-G) to learn about Spain."));
        assert_eq!(state.current_step, before.current_step);
        assert_eq!(state.detailed_mode, before.detailed_mode);
        assert_eq!(state.selected_country, before.selected_country);
    }

    #[tokio::test]
    async fn unexpected_steps_start_over() {
        let engine = engine();
        let mut state = started(&engine).await;

        state.current_step = ConversationStep::Unrecognized("ASK_QUESTION".to_string());
        assert_eq!(engine.process("x", &mut state).await, render::START_OVER_MESSAGE);
        assert_eq!(state.current_step, ConversationStep::SelectCountry);

        state.current_step = ConversationStep::ChooseOption;
        state.selected_country = None;
        assert_eq!(engine.process("A", &mut state).await, render::START_OVER_MESSAGE);
        assert_eq!(state.current_step, ConversationStep::SelectCountry);
    }

    #[tokio::test]
    async fn panicking_lookup_becomes_apology_and_reset() {
        #[derive(Default)]
        struct FaultRecorder {
            faults: Mutex<Vec<String>>,
        }

        impl DialogueHooks for FaultRecorder {
            fn on_fault(&self, _session_id: &gcommon::SessionId, message: &str) {
                self.faults
                    .lock()
                    .expect("faults lock")
                    .push(message.to_string());
            }
        }

        let hooks = Arc::new(FaultRecorder::default());
        let engine = DialogueEngine::new(Arc::new(PanickingLookup)).with_hooks(hooks.clone());
        let mut state = ConversationState::new("s1");
        engine.process("hello", &mut state).await;

        let reply = engine.process("Spain", &mut state).await;
        assert_eq!(reply, render::ENGINE_FAULT_MESSAGE);
        assert_eq!(state.current_step, ConversationStep::SelectCountry);

        state.select_country("Spain");
        let reply = engine.process("A", &mut state).await;
        assert_eq!(reply, render::ENGINE_FAULT_MESSAGE);
        assert_eq!(state.current_step, ConversationStep::SelectCountry);
        assert_eq!(state.selected_country, None);

        assert_eq!(
            *hooks.faults.lock().expect("faults lock"),
            vec!["resolver exploded".to_string(), "resolver exploded".to_string()]
        );
    }

    #[tokio::test]
    async fn exit_is_terminal_for_the_turn() {
        let engine = engine();
        let mut state = started(&engine).await;
        engine.process("Spain", &mut state).await;

        let reply = engine.process("g", &mut state).await;

        assert_eq!(reply, render::FAREWELL_MESSAGE);
        assert!(state.is_finished());
    }
}
