//! Core of a single-conversation chat client: an observable message store,
//! a dispatcher that talks to a remote reply endpoint, and editable bot
//! settings, plus a terminal front end.

pub mod attachment;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod logging;
pub mod message;
pub mod ports;
pub mod profile;
pub mod reply;
pub mod session;
pub mod store;
pub mod ui;

pub use attachment::{AttachmentEncoder, DataUri};
pub use client::ChatClient;
pub use config::Config;
pub use dispatcher::{MessageDispatcher, SendOutcome};
pub use error::{ChatError, Result};
pub use message::{ConversationState, Message, MessageId, Sender};
pub use profile::{Profile, ProfileSettings, ProfileUpdate};
pub use reply::{HttpReplyService, ReplyRequest, ReplyService};
pub use session::SessionController;
pub use store::ConversationStore;
