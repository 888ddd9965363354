//! AI completion client used by the chatbot for free-form questions.
//!
//! Speaks the Messages API format: a system prompt plus alternating
//! `user`/`assistant` turns, answered with a list of text blocks.

mod client;
mod error;
mod types;

pub use client::AiClient;
pub use error::AiError;
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, Role};
