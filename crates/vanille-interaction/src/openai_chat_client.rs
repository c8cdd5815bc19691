//! OpenAIChatClient - REST client for OpenAI-compatible chat completions.
//!
//! Works against api.openai.com or any proxy exposing the same
//! `/v1/chat/completions` endpoint.

use crate::sse;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use vanille_core::completion::{
    CompletionClient, CompletionClientFactory, CompletionRequest, DeltaStream,
};
use vanille_core::error::Result;
use vanille_core::{ChatMessage, MessageRole, Usage, VanilleError};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Client bound to one API key and host.
#[derive(Clone)]
pub struct OpenAIChatClient {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl OpenAIChatClient {
    /// Creates a client; `timeout` bounds each request and each idle gap of a stream.
    pub fn new(api_key: impl Into<String>, api_host: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| VanilleError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint_for(api_host)?,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_request(&self, body: &ChatCompletionRequest<'_>) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| {
                VanilleError::Timeout(format!(
                    "completion request exceeded {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let err = map_http_error(status, body_text);
            tracing::error!("Completion request failed: {}", err);
            return Err(err);
        }

        Ok(response)
    }
}

#[async_trait]
impl CompletionClient for OpenAIChatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage> {
        let body = ChatCompletionRequest::new(&request, false);
        tracing::debug!(
            "Completion request: model={} messages={}",
            request.model,
            request.messages.len()
        );

        let response = self.send_request(&body).await?;
        let parsed: ChatCompletionResponse =
            tokio::time::timeout(self.timeout, response.json())
                .await
                .map_err(|_| VanilleError::Timeout("reading completion response".into()))?
                .map_err(|e| {
                    VanilleError::completion(None, format!("Failed to parse response: {e}"))
                })?;

        parsed.into_message()
    }

    async fn stream(&self, request: CompletionRequest) -> Result<DeltaStream> {
        let body = ChatCompletionRequest::new(&request, true);
        tracing::debug!(
            "Streaming request: model={} messages={}",
            request.model,
            request.messages.len()
        );

        let response = self.send_request(&body).await?;
        Ok(sse::delta_stream(response.bytes_stream(), self.timeout))
    }
}

/// Creates [`OpenAIChatClient`]s with a shared timeout.
#[derive(Debug, Clone)]
pub struct OpenAIClientFactory {
    timeout: Duration,
    default_host: String,
}

impl OpenAIClientFactory {
    pub fn new(timeout: Duration, default_host: impl Into<String>) -> Self {
        Self {
            timeout,
            default_host: default_host.into(),
        }
    }
}

impl CompletionClientFactory for OpenAIClientFactory {
    fn client_for(&self, api_key: &str, api_host: &str) -> Result<Arc<dyn CompletionClient>> {
        let host = if api_host.trim().is_empty() {
            &self.default_host
        } else {
            api_host
        };
        Ok(Arc::new(OpenAIChatClient::new(api_key, host, self.timeout)?))
    }
}

/// Resolves the chat-completions URL for a host.
///
/// A bare authority (`api.openai.com`) gets `https://` and the standard path;
/// a URL with a scheme keeps its scheme, and a trailing `/v1` is not doubled.
pub fn endpoint_for(api_host: &str) -> Result<String> {
    let host = api_host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(VanilleError::config("API host is empty"));
    }
    if host.ends_with(CHAT_COMPLETIONS_PATH) {
        return Ok(host.to_string());
    }

    let base = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let base = base.trim_end_matches("/v1");
    Ok(format!("{base}{CHAT_COMPLETIONS_PATH}"))
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    fn new(request: &'a CompletionRequest, stream: bool) -> Self {
        Self {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                    name: m.name.as_deref(),
                })
                .collect(),
            temperature: request.temperature,
            stream,
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    role: Option<MessageRole>,
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_message(self) -> Result<ChatMessage> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            VanilleError::completion(None, "API returned no choices in the response")
        })?;
        let content = choice
            .message
            .content
            .ok_or_else(|| VanilleError::completion(None, "API returned no content"))?;

        // `created` is in seconds on the wire.
        let created = self
            .created
            .map(|secs| secs * 1000)
            .unwrap_or_else(vanille_core::message::now_millis);

        let mut message = ChatMessage::with_created(
            choice.message.role.unwrap_or(MessageRole::Assistant),
            content,
            created,
        )
        .with_id(self.id);
        message.model = self.model;
        message.finish_reason = choice.finish_reason;
        message.usage = self.usage;
        Ok(message)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn map_http_error(status: StatusCode, body: String) -> VanilleError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    VanilleError::completion(Some(status.as_u16()), message)
}

fn map_transport_error(err: reqwest::Error) -> VanilleError {
    if err.is_timeout() {
        VanilleError::Timeout(err.to_string())
    } else {
        VanilleError::completion(None, format!("request failed: {err}"))
    }
}
