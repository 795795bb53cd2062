//! Per-session conversation state and step machine positions.
//!
//! ```rust
//! use gchat::{ConversationState, ConversationStep};
//!
//! let mut state = ConversationState::new("session-1");
//! assert_eq!(state.current_step, ConversationStep::Welcome);
//!
//! state.record_input("Spain");
//! state.select_country("Spain");
//! assert_eq!(state.current_step, ConversationStep::ChooseOption);
//! assert_eq!(state.interaction_count, 1);
//! ```

use std::fmt::{Display, Formatter};

use gcommon::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConversationStep {
    #[default]
    Welcome,
    SelectCountry,
    ChooseOption,
    Exit,
    /// A step name this version does not know, usually from a stored context.
    Unrecognized(String),
}

impl ConversationStep {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Welcome => "WELCOME",
            Self::SelectCountry => "SELECT_COUNTRY",
            Self::ChooseOption => "CHOOSE_OPTION",
            Self::Exit => "EXIT",
            Self::Unrecognized(name) => name,
        }
    }
}

impl Display for ConversationStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ConversationStep {
    fn from(value: String) -> Self {
        match value.as_str() {
            "WELCOME" => Self::Welcome,
            "SELECT_COUNTRY" => Self::SelectCountry,
            "CHOOSE_OPTION" => Self::ChooseOption,
            "EXIT" => Self::Exit,
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<&str> for ConversationStep {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ConversationStep> for String {
    fn from(value: ConversationStep) -> Self {
        match value {
            ConversationStep::Unrecognized(name) => name,
            step => step.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: SessionId,
    #[serde(default)]
    pub selected_country: Option<String>,
    #[serde(default)]
    pub current_step: ConversationStep,
    #[serde(default)]
    pub detailed_mode: bool,
    #[serde(default)]
    pub interaction_count: u64,
    #[serde(default)]
    pub last_query: Option<String>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            selected_country: None,
            current_step: ConversationStep::Welcome,
            detailed_mode: false,
            interaction_count: 0,
            last_query: None,
        }
    }

    pub fn record_input(&mut self, raw: &str) {
        self.interaction_count = self.interaction_count.saturating_add(1);
        self.last_query = Some(raw.to_string());
    }

    pub fn select_country(&mut self, country: impl Into<String>) {
        self.selected_country = Some(country.into());
        self.current_step = ConversationStep::ChooseOption;
    }

    pub fn return_to_selection(&mut self) {
        self.selected_country = None;
        self.current_step = ConversationStep::SelectCountry;
    }

    pub fn finish(&mut self) {
        self.current_step = ConversationStep::Exit;
    }

    pub fn is_finished(&self) -> bool {
        self.current_step == ConversationStep::Exit
    }
}
