//! Bot display profile with an isolated edit draft.

use crate::attachment::{AttachmentEncoder, DataUri};
use crate::config::ProfileConfig;
use crate::error::Result;
use crate::ports::Notifier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Bot display profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: String,
    pub avatar: Option<DataUri>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::named("TuTiBot")
    }
}

impl Profile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            display_name: name.into(),
            avatar: None,
        }
    }

    /// First character of the name, shown when there is no avatar
    pub fn initial(&self) -> Option<char> {
        self.display_name.chars().next()
    }

    /// Build the starting profile from configuration.
    ///
    /// An avatar that cannot be read is skipped with a warning.
    pub async fn from_config(config: &ProfileConfig, encoder: &AttachmentEncoder) -> Self {
        let mut profile = Self::named(config.name.clone());
        if let Some(path) = &config.avatar_path {
            match encoder.encode(path).await {
                Ok(avatar) => profile.avatar = Some(avatar),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Ignoring configured avatar")
                }
            }
        }
        profile
    }
}

/// Field changes applied to the draft. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar: Option<DataUri>,
}

impl ProfileUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            display_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn avatar(avatar: DataUri) -> Self {
        Self {
            avatar: Some(avatar),
            ..Self::default()
        }
    }
}

struct ProfileState {
    committed: Profile,
    draft: Option<Profile>,
}

/// Owns the committed profile and the edit draft.
///
/// The committed profile only ever changes in [`ProfileSettings::save`],
/// which replaces it wholesale with a copy of the draft.
#[derive(Clone)]
pub struct ProfileSettings {
    state: Arc<Mutex<ProfileState>>,
    encoder: AttachmentEncoder,
    notifier: Arc<dyn Notifier>,
    saved_text: String,
}

impl ProfileSettings {
    pub fn new(committed: Profile, notifier: Arc<dyn Notifier>, saved_text: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProfileState {
                committed,
                draft: None,
            })),
            encoder: AttachmentEncoder::new(),
            notifier,
            saved_text: saved_text.into(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProfileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open an edit session: the draft becomes a copy of the committed profile.
    pub fn begin_edit(&self) {
        let mut state = self.lock();
        state.draft = Some(state.committed.clone());
    }

    /// Apply `update` to the draft. Returns `false` when no edit is open.
    pub fn update_draft(&self, update: ProfileUpdate) -> bool {
        let mut state = self.lock();
        let Some(draft) = state.draft.as_mut() else {
            tracing::debug!("Ignoring profile update without an open draft");
            return false;
        };
        if let Some(name) = update.display_name {
            draft.display_name = name;
        }
        if let Some(avatar) = update.avatar {
            draft.avatar = Some(avatar);
        }
        true
    }

    /// Replace the draft's avatar. Returns `false` when no edit is open.
    pub fn set_draft_avatar(&self, avatar: DataUri) -> bool {
        self.update_draft(ProfileUpdate::avatar(avatar))
    }

    /// Encode an image file and place it in the draft's avatar.
    ///
    /// Uploads are not cancelled by later ones; whichever read finishes last
    /// wins. If the draft was closed meanwhile, the image is dropped.
    pub async fn upload_avatar(&self, path: &Path) -> Result<bool> {
        let avatar = self.encoder.encode(path).await?;
        Ok(self.set_draft_avatar(avatar))
    }

    /// Commit the draft. Returns `false` (and stays silent) when no edit is open.
    ///
    /// The draft stays open afterwards, mirroring what was just saved.
    pub fn save(&self) -> bool {
        {
            let mut state = self.lock();
            let Some(draft) = state.draft.clone() else {
                return false;
            };
            tracing::info!(name = %draft.display_name, "Saving bot profile");
            state.committed = draft;
        }
        self.notifier.success(&self.saved_text);
        true
    }

    /// Close the edit session without committing.
    pub fn discard(&self) {
        self.lock().draft = None;
    }

    pub fn committed(&self) -> Profile {
        self.lock().committed.clone()
    }

    pub fn committed_name(&self) -> String {
        self.lock().committed.display_name.clone()
    }

    pub fn draft(&self) -> Option<Profile> {
        self.lock().draft.clone()
    }

    pub fn is_editing(&self) -> bool {
        self.lock().draft.is_some()
    }
}
