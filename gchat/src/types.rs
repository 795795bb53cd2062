//! Transcript, turn request, and turn result types.

use std::time::SystemTime;

use gcommon::{SessionId, UserId};
use serde::{Deserialize, Serialize};

use crate::{ConversationState, ConversationStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "bot" => Some(Self::Bot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: SystemTime,
}

impl TranscriptMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: SystemTime::now(),
        }
    }
}

/// Everything persisted for one session: the message log plus the latest
/// conversation state snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub messages: Vec<TranscriptMessage>,
    #[serde(default)]
    pub context: Option<ConversationState>,
    pub created_at: SystemTime,
    pub last_updated: SystemTime,
}

impl Transcript {
    pub fn new(session_id: SessionId, user_id: UserId) -> Self {
        let now = SystemTime::now();
        Self {
            session_id,
            user_id,
            messages: Vec::new(),
            context: None,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn push(&mut self, role: MessageRole, content: impl Into<String>) {
        let message = TranscriptMessage::new(role, content);
        self.last_updated = message.timestamp;
        self.messages.push(message);
    }

    pub fn set_context(&mut self, context: ConversationState) {
        self.context = Some(context);
        self.last_updated = SystemTime::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnRequest {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub user_input: String,
}

impl ChatTurnRequest {
    pub fn new(session_id: impl Into<SessionId>, user_input: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: UserId::anonymous(),
            user_input: user_input.into(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnResult {
    pub session_id: SessionId,
    pub reply: String,
    pub step: ConversationStep,
    pub selected_country: Option<String>,
    pub detailed_mode: bool,
}

impl ChatTurnResult {
    pub fn from_state(reply: String, state: &ConversationState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            reply,
            step: state.current_step.clone(),
            selected_country: state.selected_country.clone(),
            detailed_mode: state.detailed_mode,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.step == ConversationStep::Exit
    }
}
