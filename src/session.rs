use crate::config::Texts;
use crate::message::Message;
use crate::ports::Notifier;
use crate::profile::ProfileSettings;
use crate::store::ConversationStore;
use std::sync::Arc;

/// Conversation-wide resets.
///
/// `reset_chat` leaves a single greeting, `new_chat` leaves nothing.
#[derive(Clone)]
pub struct SessionController {
    store: ConversationStore,
    profile: ProfileSettings,
    notifier: Arc<dyn Notifier>,
    texts: Arc<Texts>,
}

impl SessionController {
    pub fn new(
        store: ConversationStore,
        profile: ProfileSettings,
        notifier: Arc<dyn Notifier>,
        texts: Arc<Texts>,
    ) -> Self {
        Self {
            store,
            profile,
            notifier,
            texts,
        }
    }

    /// Greeting from the currently committed bot name
    pub fn greeting(&self) -> Message {
        Message::bot(self.texts.greeting_for(&self.profile.committed_name()))
    }

    /// Put the conversation in its start state (one greeting) without notifying.
    pub fn start(&self) {
        self.store.replace_all(vec![self.greeting()]);
    }

    /// Replace the conversation with a single greeting.
    pub fn reset_chat(&self) {
        tracing::info!("Resetting chat to greeting");
        self.store.replace_all(vec![self.greeting()]);
        self.notifier.success(&self.texts.chat_restarted);
    }

    /// Empty the conversation.
    pub fn new_chat(&self) {
        tracing::info!("Starting new empty chat");
        self.store.replace_all(Vec::new());
        self.notifier.success(&self.texts.chat_created);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::testing::RecordingNotifier;
    use crate::profile::{Profile, ProfileUpdate};

    fn controller(name: &str) -> (SessionController, ConversationStore, ProfileSettings, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let texts = Arc::new(Texts::default());
        let store = ConversationStore::new();
        let profile = ProfileSettings::new(Profile::named(name), notifier.clone(), texts.settings_saved.clone());
        let session = SessionController::new(store.clone(), profile.clone(), notifier.clone(), texts);
        (session, store, profile, notifier)
    }

    #[test]
    fn test_new_chat_always_empties() {
        let (session, store, _, notifier) = controller("A");
        store.append(Message::user("hi", None));
        store.append(Message::bot("hello"));

        session.new_chat();
        assert!(store.is_empty());
        session.new_chat();
        assert!(store.is_empty());
        assert_eq!(notifier.messages(), ["New chat created", "New chat created"]);
    }

    #[test]
    fn test_reset_chat_leaves_single_greeting() {
        let (session, store, _, notifier) = controller("A");
        for i in 0..5 {
            store.append(Message::user(format!("m{i}"), None));
        }

        session.reset_chat();

        let state = store.current_state();
        assert_eq!(state.messages.len(), 1);
        assert!(state.messages[0].is_bot());
        assert_eq!(state.messages[0].text(), "Hi! I'm A. How can I help?");
        assert_eq!(notifier.messages(), ["Chat restarted"]);
    }

    #[test]
    fn test_reset_uses_committed_name_not_draft() {
        let (session, store, profile, _) = controller("A");

        profile.begin_edit();
        profile.update_draft(ProfileUpdate::name("B"));
        session.reset_chat();
        assert!(store.current_state().messages[0].text().contains('A'));
        assert!(!store.current_state().messages[0].text().contains('B'));

        profile.save();
        session.reset_chat();
        assert!(store.current_state().messages[0].text().contains('B'));
    }

    #[test]
    fn test_start_is_silent() {
        let (session, store, _, notifier) = controller("A");
        session.start();
        assert_eq!(store.len(), 1);
        assert!(notifier.messages().is_empty());
    }
}
