use crate::attachment::DataUri;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

/// Body posted to the reply endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub message: String,
    /// Only present when the message carries an image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ReplyRequest {
    pub fn new(message: impl Into<String>, image: Option<&DataUri>) -> Self {
        Self {
            message: message.into(),
            image: image.map(|uri| uri.as_str().to_string()),
        }
    }
}

/// The remote reply-generating service.
///
/// Implementations return the parsed JSON body as-is; interpreting its
/// shape is the dispatcher's job.
#[async_trait]
pub trait ReplyService: Send + Sync {
    async fn request_reply(&self, request: &ReplyRequest) -> Result<serde_json::Value>;
}

/// Pull the reply text out of a response body.
///
/// Only a non-empty string under `reply` counts; anything else is treated
/// as a malformed response.
pub fn extract_reply(body: &serde_json::Value) -> Option<&str> {
    body.get("reply")
        .and_then(|reply| reply.as_str())
        .filter(|reply| !reply.is_empty())
}

/// HTTP JSON client for the reply endpoint.
///
/// No authentication, no timeout and no retry: a call runs until the
/// transport resolves.
#[derive(Clone)]
pub struct HttpReplyService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpReplyService {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Use a preconfigured client (proxy settings, TLS roots, ...)
    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyService for HttpReplyService {
    async fn request_reply(&self, request: &ReplyRequest) -> Result<serde_json::Value> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_image = request.image.is_some(),
            "Requesting reply"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
