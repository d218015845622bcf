//! Conversation state container.

use crate::message::{ConversationState, Message};
use std::sync::Arc;
use tokio::sync::watch;

/// Owns the ordered message sequence and the loading flag.
///
/// This is a plain container with no validation. Every mutation publishes
/// a fresh snapshot to subscribers, which is how the view layer observes
/// changes. Clones share the same underlying state.
#[derive(Clone)]
pub struct ConversationStore {
    state: Arc<watch::Sender<ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConversationState::default());
        Self { state: Arc::new(tx) }
    }

    /// Add a message to the end of the sequence.
    pub fn append(&self, message: Message) {
        tracing::debug!(id = %message.id(), sender = ?message.sender(), "Appending message");
        self.state.send_modify(|state| state.messages.push(message));
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_modify(|state| state.loading = loading);
    }

    /// Swap the whole sequence. Reserved for session resets.
    pub fn replace_all(&self, messages: Vec<Message>) {
        tracing::debug!(count = messages.len(), "Replacing conversation");
        self.state.send_modify(|state| state.messages = messages);
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    /// Receive a notification for every subsequent mutation.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
