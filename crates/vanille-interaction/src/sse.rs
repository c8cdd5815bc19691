//! Server-sent event decoding for streamed chat completions.

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;
use vanille_core::completion::{CompletionDelta, DeltaStream};
use vanille_core::{MessageRole, Usage, VanilleError};

const CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
const DONE_MARKER: &str = "[DONE]";

/// What one SSE `data:` payload means for the stream.
#[derive(Debug, PartialEq)]
pub enum ChunkOutcome {
    /// `[DONE]`: the stream is complete.
    Done,
    /// Keepalive or non-standard event.
    Skip,
    Deltas(Vec<CompletionDelta>),
}

#[derive(Deserialize)]
struct ChunkData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    role: Option<MessageRole>,
    #[serde(default)]
    content: Option<String>,
}

fn is_chat_completion_chunk(event_json: &Value) -> bool {
    matches!(
        event_json.get("object").and_then(|value| value.as_str()),
        Some(CHAT_COMPLETION_CHUNK_OBJECT)
    )
}

fn extract_api_error_message(event_json: &Value) -> Option<String> {
    let error = event_json.get("error")?;
    if let Some(message) = error.get("message").and_then(|value| value.as_str()) {
        return Some(message.to_string());
    }
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    Some("An error occurred during streaming".to_string())
}

/// Interprets the data of one SSE event.
pub fn parse_chunk(raw: &str) -> Result<ChunkOutcome, VanilleError> {
    let raw = raw.trim();
    if raw == DONE_MARKER {
        return Ok(ChunkOutcome::Done);
    }
    if raw.is_empty() {
        return Ok(ChunkOutcome::Skip);
    }

    let event_json: Value = serde_json::from_str(raw)
        .map_err(|e| VanilleError::completion(None, format!("SSE parsing error: {e}")))?;

    if let Some(message) = extract_api_error_message(&event_json) {
        return Err(VanilleError::completion(None, message));
    }

    if !is_chat_completion_chunk(&event_json) {
        tracing::warn!(
            "Skipping non-standard SSE event; object={}",
            event_json
                .get("object")
                .and_then(|value| value.as_str())
                .unwrap_or("<missing>")
        );
        return Ok(ChunkOutcome::Skip);
    }

    let data: ChunkData = serde_json::from_value(event_json)
        .map_err(|e| VanilleError::completion(None, format!("SSE data schema error: {e}")))?;

    if data.choices.is_empty() {
        // Usage-only chunks still carry information worth folding in.
        return Ok(match data.usage {
            Some(usage) => ChunkOutcome::Deltas(vec![CompletionDelta {
                id: data.id,
                model: data.model,
                usage: Some(usage),
                ..Default::default()
            }]),
            None => ChunkOutcome::Skip,
        });
    }

    let usage = data.usage;
    let deltas = data
        .choices
        .into_iter()
        .map(|choice| CompletionDelta {
            id: data.id.clone(),
            role: choice.delta.role,
            content: choice.delta.content.unwrap_or_default(),
            model: data.model.clone(),
            finish_reason: choice.finish_reason,
            usage,
        })
        .collect();
    Ok(ChunkOutcome::Deltas(deltas))
}

struct StreamState<E> {
    events: Option<E>,
    pending: VecDeque<CompletionDelta>,
    finished: bool,
}

/// Turns a response body into a stream of deltas.
///
/// The stream ends at `[DONE]`, or at end of body once a finish reason was
/// seen. Any other ending, an idle gap longer than `idle_timeout`, or an
/// error payload yields one error item and ends the stream.
pub fn delta_stream<S, B, E>(body: S, idle_timeout: Duration) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        events: Some(Box::pin(body.eventsource())),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, move |mut state| async move {
        loop {
            if let Some(delta) = state.pending.pop_front() {
                return Some((Ok(delta), state));
            }
            let events = state.events.as_mut()?;

            let failure = match tokio::time::timeout(idle_timeout, events.next()).await {
                Err(_) => VanilleError::Timeout(format!(
                    "no data received for {}s",
                    idle_timeout.as_secs()
                )),
                Ok(None) if state.finished => {
                    state.events = None;
                    continue;
                }
                Ok(None) => VanilleError::completion(
                    None,
                    "SSE stream closed before response completed",
                ),
                Ok(Some(Err(e))) => VanilleError::completion(None, format!("SSE stream error: {e}")),
                Ok(Some(Ok(event))) => {
                    tracing::trace!("SSE data: {:?}", event.data);
                    match parse_chunk(&event.data) {
                        Ok(ChunkOutcome::Done) => {
                            state.events = None;
                            continue;
                        }
                        Ok(ChunkOutcome::Skip) => continue,
                        Ok(ChunkOutcome::Deltas(deltas)) => {
                            state.finished |= deltas.iter().any(|d| {
                                d.finish_reason.as_deref().is_some_and(|r| !r.is_empty())
                            });
                            state.pending.extend(deltas);
                            continue;
                        }
                        Err(e) => e,
                    }
                }
            };

            tracing::error!("Completion stream failed: {}", failure);
            state.events = None;
            return Some((Err(failure), state));
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn body(chunks: Vec<&'static str>) -> impl Stream<Item = Result<&'static str, Infallible>> {
        futures::stream::iter(chunks.into_iter().map(Ok))
    }

    #[test]
    fn done_marker_ends_stream() {
        assert_eq!(parse_chunk("[DONE]").unwrap(), ChunkOutcome::Done);
    }

    #[test]
    fn non_chunk_objects_are_skipped() {
        let raw = r#"{"id":"x","object":"ping"}"#;
        assert_eq!(parse_chunk(raw).unwrap(), ChunkOutcome::Skip);
    }

    #[test]
    fn error_payload_is_a_completion_error() {
        let err = parse_chunk(r#"{"error":{"message":"quota exceeded"}}"#).unwrap_err();
        assert!(err.is_completion());
        assert!(err.to_string().contains("quota exceeded"));

        let err = parse_chunk(r#"{"error":"boom"}"#).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn chunk_becomes_delta() {
        let raw = r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","model":"gpt-4",
            "choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"},"finish_reason":null}]}"#;
        let ChunkOutcome::Deltas(deltas) = parse_chunk(raw).unwrap() else {
            panic!("expected deltas");
        };
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].id, "chatcmpl-1");
        assert_eq!(deltas[0].role, Some(MessageRole::Assistant));
        assert_eq!(deltas[0].content, "Hel");
        assert_eq!(deltas[0].model.as_deref(), Some("gpt-4"));
        assert_eq!(deltas[0].finish_reason, None);
    }

    #[test]
    fn chunk_without_id_is_accepted() {
        let raw = r#"{"object":"chat.completion.chunk","choices":[{"delta":{"content":"Hel"}}]}"#;
        let ChunkOutcome::Deltas(deltas) = parse_chunk(raw).unwrap() else {
            panic!("expected deltas");
        };
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].id, "");
        assert_eq!(deltas[0].content, "Hel");
    }

    #[tokio::test]
    async fn stream_yields_deltas_until_done() {
        let stream = delta_stream(
            body(vec![
                "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\n\n",
                "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":\"stop\"}]}\n\n",
                "data: [DONE]\n\n",
            ]),
            Duration::from_secs(5),
        );
        let items: Vec<_> = stream.collect().await;
        let contents: Vec<String> = items
            .into_iter()
            .map(|item| item.unwrap().content)
            .collect();
        assert_eq!(contents, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn stream_closed_after_finish_reason_is_complete() {
        let stream = delta_stream(
            body(vec![
                "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"delta\":{\"content\":\"ok\"},\"finish_reason\":\"stop\"}]}\n\n",
            ]),
            Duration::from_secs(5),
        );
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn truncated_stream_ends_with_error() {
        let stream = delta_stream(
            body(vec![
                "data: {\"id\":\"c1\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n",
            ]),
            Duration::from_secs(5),
        );
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].as_ref().unwrap_err().is_completion());
    }
}
