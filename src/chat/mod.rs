//! Chat/completion engine contract.
//!
//! Paper chat and summarization share the on-device engine with embedding
//! generation, but through a separate contract: a completion call over a
//! message list with a streaming token callback. The engine itself is an
//! external collaborator; this module owns only the trait, the option and
//! timing shapes, and the prompt construction used for paper conversations.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ChatMessage, Paper};

/// Errors from the completion engine.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Engine not downloaded, not ready, or failed mid-generation
    #[error("chat engine unavailable: {0}")]
    Unavailable(String),

    /// The conversation is malformed (e.g. empty)
    #[error("invalid conversation: {0}")]
    InvalidInput(String),
}

/// Result type for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Generation parameters for one completion call.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Cap on generated tokens
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Timing reported by the engine for one completion.
#[derive(Debug, Clone, Default)]
pub struct GenerationTiming {
    /// Wall time for the whole call
    pub total: Duration,

    /// Generated tokens per second, when the engine reports it
    pub tokens_per_second: Option<f32>,
}

/// A finished completion: the full response plus timing.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Complete response text (the concatenation of streamed tokens)
    pub response: String,

    /// Engine-reported timing
    pub timing: GenerationTiming,
}

/// Callback invoked once per streamed token, for progressive display.
pub type TokenCallback<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Trait for streaming completion engines.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run one completion over `messages`, streaming tokens to `on_token`
    /// and returning the assembled outcome.
    ///
    /// # Errors
    /// Returns [`ChatError::Unavailable`] when the engine cannot serve the
    /// call; callers surface this as a non-blocking notice.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        on_token: TokenCallback<'_>,
    ) -> ChatResult<ChatOutcome>;
}

/// System prompt grounding a conversation in one paper.
pub fn paper_chat_prompt(paper: &Paper) -> ChatMessage {
    ChatMessage::system(format!(
        "You are discussing the paper \"{}\".\n\nAbstract: {}\n\n\
         Answer questions about this paper concisely and accurately.",
        paper.title, paper.abstract_text
    ))
}

/// One-shot conversation asking for a summary of a paper.
pub fn summarization_messages(paper: &Paper) -> Vec<ChatMessage> {
    vec![
        paper_chat_prompt(paper),
        ChatMessage::user("Summarize this paper in a short paragraph for a technical reader."),
    ]
}
