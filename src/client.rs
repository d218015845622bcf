//! Wiring of the chat core into one handle for front ends.

use crate::config::Config;
use crate::dispatcher::MessageDispatcher;
use crate::ports::{Notifier, PickerKind, ViewPort};
use crate::profile::{Profile, ProfileSettings};
use crate::reply::ReplyService;
use crate::session::SessionController;
use crate::store::ConversationStore;
use std::sync::Arc;

/// The assembled chat core: one conversation, one endpoint, one bot profile.
#[derive(Clone)]
pub struct ChatClient {
    store: ConversationStore,
    profile: ProfileSettings,
    dispatcher: MessageDispatcher,
    session: SessionController,
    view: Arc<dyn ViewPort>,
}

impl ChatClient {
    /// Build the core and put the conversation in its start state (a single greeting).
    pub fn new(
        config: &Config,
        profile: Profile,
        service: Arc<dyn ReplyService>,
        view: Arc<dyn ViewPort>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let texts = Arc::new(config.texts.clone());
        let store = ConversationStore::new();
        let profile = ProfileSettings::new(profile, notifier.clone(), texts.settings_saved.clone());
        let dispatcher = MessageDispatcher::new(store.clone(), service, view.clone(), texts.clone())
            .serialized(config.serialize_sends);
        let session = SessionController::new(store.clone(), profile.clone(), notifier, texts);
        session.start();

        Self {
            store,
            profile,
            dispatcher,
            session,
            view,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn profile(&self) -> &ProfileSettings {
        &self.profile
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Ask the view for an image to attach to the next message.
    pub fn request_attachment(&self) {
        self.view.open_file_picker(PickerKind::ChatAttachment);
    }

    /// Ask the view for an avatar image, opening an edit session if needed.
    pub fn request_avatar(&self) {
        if !self.profile.is_editing() {
            self.profile.begin_edit();
        }
        self.view.open_file_picker(PickerKind::Avatar);
    }
}
