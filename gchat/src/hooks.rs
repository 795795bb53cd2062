//! Dialogue observation points.

use gcommon::SessionId;

use crate::ConversationStep;

pub trait DialogueHooks: Send + Sync {
    fn on_turn_start(&self, _session_id: &SessionId, _step: &ConversationStep) {}

    fn on_transition(&self, _session_id: &SessionId, _from: &ConversationStep, _to: &ConversationStep) {
    }

    /// A step handler panicked and the conversation was reset.
    fn on_fault(&self, _session_id: &SessionId, _message: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDialogueHooks;

impl DialogueHooks for NoopDialogueHooks {}
