//! Capabilities the core needs from its surroundings.
//!
//! The core never touches a rendering surface or a global toast API;
//! front ends inject implementations of these traits instead.

/// Which file picker to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    /// Image attached to the next chat message
    ChatAttachment,
    /// Avatar for the profile draft
    Avatar,
}

/// View-side hooks.
pub trait ViewPort: Send + Sync {
    /// Bring the newest message into view. Fire-and-forget.
    fn scroll_to_latest(&self);

    /// Ask the front end to let the user choose an image file.
    fn open_file_picker(&self, kind: PickerKind);
}

/// Positive user-facing notifications ("toasts").
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
}

/// View port for headless use; only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullViewPort;

impl ViewPort for NullViewPort {
    fn scroll_to_latest(&self) {}

    fn open_file_picker(&self, kind: PickerKind) {
        tracing::debug!(?kind, "File picker requested without a view");
    }
}

/// Notifier that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
    }
}
