//! Attachment encoding: turns image files into inline `data:` URIs.
//!
//! The same encoding is used for chat image attachments and for profile
//! avatars, so both surfaces share [`AttachmentEncoder`].

use crate::error::{ChatError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A self-describing inline encoding of binary content: `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataUri(String);

impl DataUri {
    /// Encode raw bytes with the given media type.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self(format!(
            "{}{}{}{}",
            DATA_PREFIX,
            mime_type,
            BASE64_MARKER,
            BASE64_STANDARD.encode(bytes)
        ))
    }

    /// Accept an existing data URI string after checking its header.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let Some(rest) = value.strip_prefix(DATA_PREFIX) else {
            return Err(ChatError::invalid_data_uri("missing 'data:' prefix"));
        };
        if !rest.contains(BASE64_MARKER) {
            return Err(ChatError::invalid_data_uri("only base64 payloads are supported"));
        }
        Ok(Self(value))
    }

    /// Media type declared in the header, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        let rest = &self.0[DATA_PREFIX.len()..];
        rest.find(BASE64_MARKER).map(|end| &rest[..end]).unwrap_or("")
    }

    /// The base64 payload after the header.
    pub fn payload(&self) -> &str {
        self.0
            .find(BASE64_MARKER)
            .map(|start| &self.0[start + BASE64_MARKER.len()..])
            .unwrap_or("")
    }

    /// Recover the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64_STANDARD
            .decode(self.payload())
            .map_err(|err| ChatError::invalid_data_uri(err.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DataUri {
    type Error = ChatError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<DataUri> for String {
    fn from(uri: DataUri) -> Self {
        uri.0
    }
}

/// Reads files and produces [`DataUri`]s.
///
/// No size or type validation happens here; the file picker's `image/*`
/// filter (see [`is_image`]) is the only gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentEncoder;

impl AttachmentEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Read `path` and encode it, guessing the media type from the extension.
    pub async fn encode(&self, path: &Path) -> Result<DataUri> {
        let bytes = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        tracing::debug!(
            path = %path.display(),
            mime = %mime,
            bytes = bytes.len(),
            "Encoded attachment"
        );
        Ok(DataUri::encode(mime.essence_str(), &bytes))
    }

    /// Encode bytes that are already in memory.
    pub fn encode_bytes(&self, mime_type: &str, bytes: &[u8]) -> DataUri {
        DataUri::encode(mime_type, bytes)
    }
}

/// The `image/*` filter applied by file pickers before anything is encoded.
pub fn is_image(path: &Path) -> bool {
    mime_guess::from_path(path)
        .iter()
        .any(|mime| mime.type_() == mime_guess::mime::IMAGE)
}
