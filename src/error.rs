use thiserror::Error;

/// Failures talking to the hosted completion endpoint.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("request to completion endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("missing output text from chat completion response")]
    EmptyResponse,

    #[error("could not decode completion response: {0}")]
    Decode(String),
}

/// Raised when neither the primary nor the fallback model produced text.
/// Callers treat this as "analysis unavailable", never as fatal.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("analysis unavailable: {primary_model} failed ({primary})")]
    Unavailable {
        primary_model: String,
        primary: LlmError,
    },

    #[error("analysis unavailable: {primary_model} failed ({primary}); fallback {fallback_model} failed ({fallback})")]
    FallbackFailed {
        primary_model: String,
        primary: LlmError,
        fallback_model: String,
        fallback: LlmError,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("temperature must be within 0.0..=2.0, got {0}")]
    Temperature(f32),

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("base url must start with http:// or https://, got '{0}'")]
    BaseUrl(String),

    #[error("{field} must not be empty")]
    EmptyModel { field: &'static str },

    #[error("unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}
