use crate::attachment::DataUri;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique message identifier (random v4 UUID, so two messages created in
/// the same clock tick never collide).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A single chat message. Immutable once built: fields are private and
/// there are no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    text: String,
    sender: Sender,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<DataUri>,
}

impl Message {
    /// A message typed by the user, optionally carrying an image.
    pub fn user(text: impl Into<String>, attachment: Option<DataUri>) -> Self {
        Self::build(Sender::User, text.into(), attachment)
    }

    /// A message from the bot side. Bots never attach images.
    pub fn bot(text: impl Into<String>) -> Self {
        Self::build(Sender::Bot, text.into(), None)
    }

    fn build(sender: Sender, text: String, attachment: Option<DataUri>) -> Self {
        Self {
            id: MessageId::new(),
            text,
            sender,
            timestamp: Utc::now(),
            attachment,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn attachment(&self) -> Option<&DataUri> {
        self.attachment.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

/// Snapshot of everything the view renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub loading: bool,
}

impl ConversationState {
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique_within_a_burst() {
        let ids: HashSet<MessageId> = (0..1000).map(|_| Message::bot("x").id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_constructors_fix_sender() {
        let uri = DataUri::encode("image/png", &[1, 2]);
        let user = Message::user("look", Some(uri.clone()));
        assert!(user.is_user());
        assert_eq!(user.attachment(), Some(&uri));

        let bot = Message::bot("nice");
        assert!(bot.is_bot());
        assert!(bot.attachment().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let message = Message::user("hi", None);
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["sender"], "user");
        assert_eq!(json["text"], "hi");
        assert!(json.get("attachment").is_none());
    }
}
