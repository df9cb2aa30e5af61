use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ExtractionError, LlmError};
use crate::llm::prompts::{self, Language, SchemaKind};
use crate::transcript::truncate_chars;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text in, text out. The hosted service sits behind this seam.
pub trait CompletionBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

impl<B: CompletionBackend + ?Sized> CompletionBackend for &B {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request)
    }
}

impl<B: CompletionBackend + ?Sized> CompletionBackend for Box<B> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request)
    }
}

/// OpenAI-compatible `/chat/completions` over a blocking client.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl CompletionBackend for OpenAiBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Http { status, body });
        }

        let value: Value = response
            .json()
            .map_err(|e| LlmError::Decode(e.to_string()))?;
        let output = extract_output_text(&value).ok_or(LlmError::EmptyResponse)?;
        Ok(output.trim().to_string())
    }
}

/// First non-empty `choices[].message.content`.
pub fn extract_output_text(value: &Value) -> Option<String> {
    let choices = value.get("choices")?.as_array()?;
    for choice in choices {
        let content = choice.get("message").and_then(|m| m.get("content"));
        match content {
            Some(Value::String(text)) if !text.trim().is_empty() => return Some(text.clone()),
            // Some compatible servers return content parts instead of a string.
            Some(Value::Array(parts)) => {
                let text: String = parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect();
                if !text.trim().is_empty() {
                    return Some(text);
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    pub model: String,
    pub fallback_model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Overrides the per-schema character budget.
    pub max_chars: Option<usize>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            fallback_model: Some("gpt-3.5-turbo".to_string()),
            temperature: 0.0,
            max_tokens: 2048,
            max_chars: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub raw_text: String,
    pub model: String,
    /// User-facing notes: truncation, fallback use.
    pub warnings: Vec<String>,
    pub truncated: bool,
}

pub struct ExtractionClient<B> {
    backend: B,
    settings: ExtractionSettings,
}

impl<B: CompletionBackend> ExtractionClient<B> {
    pub fn new(backend: B, settings: ExtractionSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    pub fn request_for(
        &self,
        model: &str,
        schema: SchemaKind,
        language: Language,
        text: &str,
    ) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::system(prompts::instruction(schema, language)),
                ChatMessage::user(prompts::user_prompt(text)),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Asks the primary model for structured JSON, retrying once on the fallback.
    pub fn extract(
        &self,
        schema: SchemaKind,
        language: Language,
        transcript: &str,
    ) -> Result<Extraction, ExtractionError> {
        let budget = self.settings.max_chars.unwrap_or_else(|| schema.char_budget());
        let (text, truncated) = truncate_chars(transcript, budget);
        let mut warnings = Vec::new();
        if truncated {
            warnings.push(format!("transcript truncated to {budget} characters"));
        }

        let primary_model = self.settings.model.as_str();
        info!(
            model = primary_model,
            %schema,
            chars = text.chars().count(),
            "requesting structured extraction"
        );

        let primary = self
            .backend
            .complete(&self.request_for(primary_model, schema, language, text));
        let primary_err = match primary {
            Ok(raw_text) => {
                return Ok(Extraction {
                    raw_text,
                    model: primary_model.to_string(),
                    warnings,
                    truncated,
                })
            }
            Err(err) => err,
        };

        let Some(fallback_model) = self.settings.fallback_model.as_deref() else {
            warn!(
                model = primary_model,
                error = %primary_err,
                "extraction failed, no fallback configured"
            );
            return Err(ExtractionError::Unavailable {
                primary_model: primary_model.to_string(),
                primary: primary_err,
            });
        };

        warn!(
            model = primary_model,
            fallback = fallback_model,
            error = %primary_err,
            "extraction failed, retrying with fallback model"
        );
        warnings.push(format!(
            "{primary_model} failed ({primary_err}); retried with {fallback_model}"
        ));

        match self
            .backend
            .complete(&self.request_for(fallback_model, schema, language, text))
        {
            Ok(raw_text) => Ok(Extraction {
                raw_text,
                model: fallback_model.to_string(),
                warnings,
                truncated,
            }),
            Err(fallback_err) => {
                warn!(model = fallback_model, error = %fallback_err, "fallback extraction failed");
                Err(ExtractionError::FallbackFailed {
                    primary_model: primary_model.to_string(),
                    primary: primary_err,
                    fallback_model: fallback_model.to_string(),
                    fallback: fallback_err,
                })
            }
        }
    }
}
