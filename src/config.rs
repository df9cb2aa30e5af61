use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;
use crate::llm::client::{ExtractionSettings, DEFAULT_BASE_URL};
use crate::llm::{Language, SchemaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Maps workshop transcripts to process flows and org charts.
#[derive(Debug, Parser)]
#[command(name = "workshop-mapper", version, about)]
pub struct Cli {
    /// Transcript file; reads stdin when omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Keep a session open and analyse one transcript after another.
    #[arg(long, conflicts_with = "input")]
    pub interactive: bool,

    /// Schema to request: flat, nested or pro.
    #[arg(long, default_value = "nested")]
    pub schema: SchemaKind,

    /// Language for extracted text: es or en.
    #[arg(long, default_value = "es")]
    pub lang: Language,

    /// Directory to write exports into.
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "WORKSHOP_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Model tried once when the primary fails; `none` disables the retry.
    #[arg(long, env = "WORKSHOP_FALLBACK_MODEL", default_value = "gpt-3.5-turbo")]
    pub fallback_model: String,

    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,

    #[arg(long, default_value_t = 2048)]
    pub max_tokens: u32,

    /// Character budget for the transcript; defaults per schema (4000 flat, 6000 otherwise).
    #[arg(long)]
    pub max_chars: Option<usize>,
}

/// Settings that shape the extraction call, resolved from flags and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub fallback_model: Option<String>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_chars: Option<usize>,
    pub schema: SchemaKind,
    pub language: Language,
}

impl Default for Config {
    fn default() -> Self {
        let settings = ExtractionSettings::default();
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: settings.model,
            fallback_model: settings.fallback_model,
            timeout: Duration::from_secs(60),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_chars: settings.max_chars,
            schema: SchemaKind::default(),
            language: Language::default(),
        }
    }
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let fallback = cli.fallback_model.trim();
        let config = Self {
            api_key: cli
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            base_url: cli.base_url.trim().to_string(),
            model: cli.model.trim().to_string(),
            fallback_model: match fallback.to_lowercase().as_str() {
                "" | "none" | "off" => None,
                _ => Some(fallback.to_string()),
            },
            timeout: Duration::from_secs(cli.timeout_secs),
            temperature: cli.temperature,
            max_tokens: cli.max_tokens,
            max_chars: cli.max_chars,
            schema: cli.schema,
            language: cli.lang,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Temperature(self.temperature));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::NotPositive { field: "timeout" });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::NotPositive { field: "max_tokens" });
        }
        if self.max_chars == Some(0) {
            return Err(ConfigError::NotPositive { field: "max_chars" });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::BaseUrl(self.base_url.clone()));
        }
        if self.model.is_empty() {
            return Err(ConfigError::EmptyModel { field: "model" });
        }
        Ok(())
    }

    pub fn extraction_settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            model: self.model.clone(),
            fallback_model: self.fallback_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_chars: self.max_chars,
        }
    }
}
