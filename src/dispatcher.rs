//! Send pipeline: optimistic append, remote call, reconciliation.

use crate::attachment::{AttachmentEncoder, DataUri};
use crate::config::Texts;
use crate::error::Result;
use crate::message::Message;
use crate::ports::ViewPort;
use crate::reply::{ReplyRequest, ReplyService, extract_reply};
use crate::store::ConversationStore;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How a call to [`MessageDispatcher::send`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Nothing to send; state untouched
    Rejected,
    /// The service answered with a reply
    Replied,
    /// The service answered without a usable `reply`; generic text appended
    MissingReply,
    /// No usable response (transport, HTTP status or parse failure); unreachable text appended
    Unreachable,
}

/// Orchestrates sending a user message and reconciling the bot reply.
///
/// Overlapping sends are not queued unless [`MessageDispatcher::serialized`]
/// is enabled: user messages land in call order, bot replies in completion
/// order.
#[derive(Clone)]
pub struct MessageDispatcher {
    store: ConversationStore,
    service: Arc<dyn ReplyService>,
    view: Arc<dyn ViewPort>,
    encoder: AttachmentEncoder,
    texts: Arc<Texts>,
    input: Arc<Mutex<String>>,
    in_flight: Arc<Mutex<usize>>,
    serial: Option<Arc<tokio::sync::Mutex<()>>>,
}

impl MessageDispatcher {
    pub fn new(
        store: ConversationStore,
        service: Arc<dyn ReplyService>,
        view: Arc<dyn ViewPort>,
        texts: Arc<Texts>,
    ) -> Self {
        Self {
            store,
            service,
            view,
            encoder: AttachmentEncoder::new(),
            texts,
            input: Arc::new(Mutex::new(String::new())),
            in_flight: Arc::new(Mutex::new(0)),
            serial: None,
        }
    }

    /// Keep at most one remote call in flight so replies arrive in send order.
    pub fn serialized(mut self, enabled: bool) -> Self {
        self.serial = enabled.then(|| Arc::new(tokio::sync::Mutex::new(())));
        self
    }

    /// Mirror of the composer's text field
    pub fn set_input(&self, text: impl Into<String>) {
        *lock(&self.input) = text.into();
    }

    pub fn input(&self) -> String {
        lock(&self.input).clone()
    }

    /// Send `text` (and optionally an image) and wait for the reply.
    ///
    /// Never fails: every failure is turned into a bot message and the
    /// loading flag is always cleared before returning.
    pub async fn send(&self, text: &str, attachment: Option<DataUri>) -> SendOutcome {
        if text.trim().is_empty() && attachment.is_none() {
            tracing::debug!("Ignoring empty send");
            return SendOutcome::Rejected;
        }

        let request = ReplyRequest::new(text, attachment.as_ref());
        self.store.append(Message::user(text, attachment));
        self.set_input(String::new());
        self.begin_request();
        self.view.scroll_to_latest();

        let result = match &self.serial {
            Some(serial) => {
                let _turn = serial.lock().await;
                self.service.request_reply(&request).await
            }
            None => self.service.request_reply(&request).await,
        };

        let (reply, outcome) = match result {
            Ok(body) => match extract_reply(&body) {
                Some(reply) => (reply.to_string(), SendOutcome::Replied),
                None => {
                    tracing::warn!(%body, "Reply missing from response");
                    (self.texts.generic_error.clone(), SendOutcome::MissingReply)
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "Reply request failed");
                (self.texts.unreachable.clone(), SendOutcome::Unreachable)
            }
        };

        self.store.append(Message::bot(reply));
        self.end_request();
        self.view.scroll_to_latest();
        outcome
    }

    /// Encode an image and send it, captioned with the pending input or the
    /// default caption when the input is empty.
    ///
    /// An unreadable file leaves the conversation untouched.
    pub async fn send_attachment(&self, path: &Path) -> Result<SendOutcome> {
        let attachment = self.encoder.encode(path).await.inspect_err(|err| {
            tracing::warn!(path = %path.display(), error = %err, "Attachment could not be read");
        })?;

        let input = self.input();
        let caption = if input.is_empty() {
            self.texts.default_caption.clone()
        } else {
            input
        };
        Ok(self.send(&caption, Some(attachment)).await)
    }

    fn begin_request(&self) {
        let mut in_flight = lock(&self.in_flight);
        *in_flight += 1;
        self.store.set_loading(true);
    }

    fn end_request(&self) {
        let mut in_flight = lock(&self.in_flight);
        *in_flight = in_flight.saturating_sub(1);
        self.store.set_loading(*in_flight > 0);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::message::Sender;
    use crate::ports::testing::RecordingViewPort;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::{HashMap, VecDeque};
    use std::io::Write;
    use tokio::sync::oneshot;

    /// Answers each request with the next scripted result.
    #[derive(Default)]
    struct ScriptedService {
        results: Mutex<VecDeque<crate::error::Result<Value>>>,
        requests: Mutex<Vec<ReplyRequest>>,
    }

    impl ScriptedService {
        fn with(results: Vec<crate::error::Result<Value>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ReplyRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyService for ScriptedService {
        async fn request_reply(&self, request: &ReplyRequest) -> crate::error::Result<Value> {
            self.requests.lock().unwrap().push(request.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({ "reply": "default" })))
        }
    }

    /// Each request waits until the test releases the gate keyed by its message.
    #[derive(Default)]
    struct GatedService {
        gates: Mutex<HashMap<String, oneshot::Receiver<Value>>>,
    }

    impl GatedService {
        fn gate(&self, message: &str) -> oneshot::Sender<Value> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(message.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl ReplyService for GatedService {
        async fn request_reply(&self, request: &ReplyRequest) -> crate::error::Result<Value> {
            let rx = self.gates.lock().unwrap().remove(&request.message).unwrap();
            Ok(rx.await.unwrap())
        }
    }

    fn transport_error() -> ChatError {
        ChatError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"))
    }

    fn dispatcher(service: Arc<dyn ReplyService>) -> (MessageDispatcher, ConversationStore, Arc<RecordingViewPort>) {
        let store = ConversationStore::new();
        let view = Arc::new(RecordingViewPort::default());
        let dispatcher = MessageDispatcher::new(store.clone(), service, view.clone(), Arc::new(Texts::default()));
        (dispatcher, store, view)
    }

    fn transcript(store: &ConversationStore) -> Vec<(Sender, String)> {
        store
            .current_state()
            .messages
            .iter()
            .map(|m| (m.sender(), m.text().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_send_is_rejected() {
        let service = ScriptedService::with(vec![]);
        let (dispatcher, store, view) = dispatcher(service.clone());
        dispatcher.set_input("   ");

        assert_eq!(dispatcher.send("", None).await, SendOutcome::Rejected);
        assert_eq!(dispatcher.send(" \n\t", None).await, SendOutcome::Rejected);

        assert!(store.is_empty());
        assert!(!store.is_loading());
        assert!(service.requests().is_empty());
        assert_eq!(view.scrolls(), 0);
        assert_eq!(dispatcher.input(), "   ");
    }

    #[tokio::test]
    async fn test_successful_reply() {
        let service = ScriptedService::with(vec![Ok(json!({ "reply": "Hi there" }))]);
        let (dispatcher, store, view) = dispatcher(service.clone());
        dispatcher.set_input("Hello");

        assert_eq!(dispatcher.send("Hello", None).await, SendOutcome::Replied);

        assert_eq!(
            transcript(&store),
            [(Sender::User, "Hello".to_string()), (Sender::Bot, "Hi there".to_string())]
        );
        assert!(!store.is_loading());
        assert_eq!(dispatcher.input(), "");
        assert_eq!(view.scrolls(), 2);
        assert_eq!(service.requests(), [ReplyRequest::new("Hello", None)]);
    }

    #[tokio::test]
    async fn test_transport_failure_appends_unreachable_text() {
        let service = ScriptedService::with(vec![Err(transport_error())]);
        let (dispatcher, store, view) = dispatcher(service);

        assert_eq!(dispatcher.send("Hello", None).await, SendOutcome::Unreachable);

        assert_eq!(
            transcript(&store),
            [
                (Sender::User, "Hello".to_string()),
                (Sender::Bot, Texts::default().unreachable),
            ]
        );
        assert!(!store.is_loading());
        assert_eq!(view.scrolls(), 2);
    }

    #[tokio::test]
    async fn test_http_status_and_parse_failures_are_unreachable() {
        let parse_error = serde_json::from_str::<Value>("<html>").unwrap_err();
        let service = ScriptedService::with(vec![
            Err(ChatError::HttpStatus {
                status: 503,
                body: String::new(),
            }),
            Err(parse_error.into()),
        ]);
        let (dispatcher, store, _) = dispatcher(service);

        assert_eq!(dispatcher.send("one", None).await, SendOutcome::Unreachable);
        assert_eq!(dispatcher.send("two", None).await, SendOutcome::Unreachable);
        assert_eq!(store.len(), 4);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_missing_reply_uses_generic_text() {
        let service = ScriptedService::with(vec![
            Ok(json!({ "error": "no key" })),
            Ok(json!({ "reply": null })),
            Ok(json!({ "reply": "" })),
        ]);
        let (dispatcher, store, _) = dispatcher(service);

        for text in ["a", "b", "c"] {
            assert_eq!(dispatcher.send(text, None).await, SendOutcome::MissingReply);
        }

        let state = store.current_state();
        assert_eq!(state.messages.len(), 6);
        let generic = Texts::default().generic_error;
        assert!(state.messages.iter().filter(|m| m.is_bot()).all(|m| m.text() == generic));
    }

    #[tokio::test]
    async fn test_loading_is_set_while_waiting() {
        let service = Arc::new(GatedService::default());
        let release = service.gate("Hello");
        let (dispatcher, store, _) = dispatcher(service.clone());

        let pending = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.send("Hello", None).await }
        });

        let mut rx = store.subscribe();
        rx.wait_for(|state| state.loading).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.current_state().messages[0].is_user());

        release.send(json!({ "reply": "done" })).unwrap();
        assert_eq!(pending.await.unwrap(), SendOutcome::Replied);
        assert!(!store.is_loading());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_sends_reconcile_in_completion_order() {
        let service = Arc::new(GatedService::default());
        let first = service.gate("first");
        let second = service.gate("second");
        let (dispatcher, store, _) = dispatcher(service.clone());

        let send_first = dispatcher.send("first", None);
        let send_second = dispatcher.send("second", None);
        let release = async {
            let mut rx = store.subscribe();
            rx.wait_for(|state| state.messages.len() == 2).await.unwrap();
            second.send(json!({ "reply": "reply to second" })).unwrap();
            rx.wait_for(|state| state.messages.len() == 3).await.unwrap();
            assert!(store.is_loading());
            first.send(json!({ "reply": "reply to first" })).unwrap();
        };

        let (a, b, ()) = futures::join!(send_first, send_second, release);
        assert_eq!((a, b), (SendOutcome::Replied, SendOutcome::Replied));

        assert_eq!(
            transcript(&store),
            [
                (Sender::User, "first".to_string()),
                (Sender::User, "second".to_string()),
                (Sender::Bot, "reply to second".to_string()),
                (Sender::Bot, "reply to first".to_string()),
            ]
        );
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_serialized_sends_reply_in_send_order() {
        let service = Arc::new(GatedService::default());
        let first = service.gate("first");
        let second = service.gate("second");
        let (dispatcher, store, _) = dispatcher(service.clone());
        let dispatcher = dispatcher.serialized(true);

        // The second reply is ready before the first, but its request cannot
        // start until the first completes.
        second.send(json!({ "reply": "reply to second" })).unwrap();
        let release = async {
            let mut rx = store.subscribe();
            rx.wait_for(|state| state.messages.len() == 2).await.unwrap();
            tokio::task::yield_now().await;
            first.send(json!({ "reply": "reply to first" })).unwrap();
        };

        futures::join!(dispatcher.send("first", None), dispatcher.send("second", None), release);

        let bots: Vec<_> = transcript(&store)
            .into_iter()
            .filter(|(sender, _)| *sender == Sender::Bot)
            .map(|(_, text)| text)
            .collect();
        assert_eq!(bots, ["reply to first", "reply to second"]);
    }

    #[tokio::test]
    async fn test_attachment_with_default_caption() {
        let service = ScriptedService::with(vec![Ok(json!({ "reply": "A cat" }))]);
        let (dispatcher, store, _) = dispatcher(service.clone());
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let outcome = dispatcher.send_attachment(file.path()).await.unwrap();
        assert_eq!(outcome, SendOutcome::Replied);

        let state = store.current_state();
        let user = &state.messages[0];
        assert_eq!(user.text(), Texts::default().default_caption);
        let attachment = user.attachment().unwrap();
        assert_eq!(attachment.decode().unwrap(), [0x89, b'P', b'N', b'G']);

        let request = &service.requests()[0];
        assert_eq!(request.image.as_deref(), Some(attachment.as_str()));
    }

    #[tokio::test]
    async fn test_attachment_uses_pending_input_as_caption() {
        let service = ScriptedService::with(vec![]);
        let (dispatcher, store, _) = dispatcher(service);
        let mut file = tempfile::Builder::new().suffix(".gif").tempfile().unwrap();
        file.write_all(b"GIF89a").unwrap();

        dispatcher.set_input("what is this?");
        dispatcher.send_attachment(file.path()).await.unwrap();

        assert_eq!(store.current_state().messages[0].text(), "what is this?");
        assert_eq!(dispatcher.input(), "");
    }

    #[tokio::test]
    async fn test_attachment_alone_is_enough_to_send() {
        let service = ScriptedService::with(vec![]);
        let (dispatcher, store, _) = dispatcher(service);
        let image = DataUri::encode("image/png", &[1]);

        assert_eq!(dispatcher.send("", Some(image)).await, SendOutcome::Replied);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_attachment_changes_nothing() {
        let service = ScriptedService::with(vec![]);
        let (dispatcher, store, _) = dispatcher(service.clone());
        let dir = tempfile::tempdir().unwrap();

        assert!(dispatcher.send_attachment(&dir.path().join("gone.png")).await.is_err());
        assert!(store.is_empty());
        assert!(service.requests().is_empty());
    }
}
