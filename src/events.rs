use crate::ports::{Notifier, PickerKind, ViewPort};
use tokio::sync::mpsc;

/// Internal application events for coordinating between the core and the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Bring the newest message into view
    ScrollToLatest,

    /// Let the user pick an image file
    OpenFilePicker(PickerKind),

    /// Show a success toast
    Notify(String),

    /// Show an error in the status line
    ShowError(String),
}

/// [`ViewPort`] that forwards requests to the TUI event loop
#[derive(Clone)]
pub struct ChannelViewPort {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ChannelViewPort {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl ViewPort for ChannelViewPort {
    fn scroll_to_latest(&self) {
        let _ = self.tx.send(AppEvent::ScrollToLatest);
    }

    fn open_file_picker(&self, kind: PickerKind) {
        let _ = self.tx.send(AppEvent::OpenFilePicker(kind));
    }
}

/// [`Notifier`] that forwards toasts to the TUI event loop
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
        let _ = self.tx.send(AppEvent::Notify(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_forward_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let view = ChannelViewPort::new(tx.clone());
        let notifier = ChannelNotifier::new(tx);

        view.scroll_to_latest();
        view.open_file_picker(PickerKind::Avatar);
        notifier.success("Settings saved");

        assert_eq!(rx.try_recv().unwrap(), AppEvent::ScrollToLatest);
        assert_eq!(rx.try_recv().unwrap(), AppEvent::OpenFilePicker(PickerKind::Avatar));
        assert_eq!(rx.try_recv().unwrap(), AppEvent::Notify("Settings saved".to_string()));
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        ChannelViewPort::new(tx.clone()).scroll_to_latest();
        ChannelNotifier::new(tx).success("nobody listening");
    }
}
