//! Remote completion service access.
//!
//! Implements `vanille_core::completion::CompletionClient` over the OpenAI
//! chat-completions HTTP API and lists the models the client offers.

pub mod openai_chat_client;
pub mod sse;
pub mod supported_models;

pub use openai_chat_client::{OpenAIChatClient, OpenAIClientFactory};
