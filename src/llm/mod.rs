//! Structured-extraction client for the hosted chat-completion endpoint.

pub mod client;
pub mod prompts;

pub use client::{
    ChatMessage, CompletionBackend, CompletionRequest, Extraction, ExtractionClient,
    ExtractionSettings, OpenAiBackend,
};
pub use prompts::{Language, SchemaKind};
