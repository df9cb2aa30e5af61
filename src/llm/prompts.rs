use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

/// Which slice of the canonical schema the model is asked to fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Steps, actors, inputs, outputs and pains.
    Flat,
    /// Organization, process and participants.
    #[default]
    Nested,
    /// Everything, including KPIs, decisions and recommendations.
    Pro,
}

impl SchemaKind {
    /// Default character budget for the transcript sent with this schema.
    pub fn char_budget(self) -> usize {
        match self {
            SchemaKind::Flat => 4000,
            SchemaKind::Nested | SchemaKind::Pro => 6000,
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            SchemaKind::Flat => &[
                Field::Steps,
                Field::Actors,
                Field::Inputs,
                Field::Outputs,
                Field::Pains,
            ],
            SchemaKind::Nested => &[
                Field::Summary,
                Field::Organization,
                Field::Steps,
                Field::Participants,
                Field::Pains,
            ],
            SchemaKind::Pro => &[
                Field::Summary,
                Field::Organization,
                Field::Steps,
                Field::Participants,
                Field::Pains,
                Field::Kpis,
                Field::Decisions,
                Field::Recommendations,
            ],
        }
    }
}

impl FromStr for SchemaKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flat" => Ok(SchemaKind::Flat),
            "nested" => Ok(SchemaKind::Nested),
            "pro" => Ok(SchemaKind::Pro),
            other => Err(ConfigError::UnknownValue {
                kind: "schema",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemaKind::Flat => "flat",
            SchemaKind::Nested => "nested",
            SchemaKind::Pro => "pro",
        })
    }
}

/// Language for free-text values in the model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    fn name(self) -> &'static str {
        match self {
            Language::Es => "Spanish",
            Language::En => "English",
        }
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Language::Es),
            "en" | "english" => Ok(Language::En),
            other => Err(ConfigError::UnknownValue {
                kind: "language",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::Es => "es",
            Language::En => "en",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Summary,
    Steps,
    Organization,
    Participants,
    Actors,
    Inputs,
    Outputs,
    Pains,
    Kpis,
    Decisions,
    Recommendations,
}

impl Field {
    fn key(self) -> &'static str {
        match self {
            Field::Summary => "summary",
            Field::Steps => "steps",
            Field::Organization => "organization",
            Field::Participants => "participants",
            Field::Actors => "actors",
            Field::Inputs => "inputs",
            Field::Outputs => "outputs",
            Field::Pains => "pains",
            Field::Kpis => "kpis",
            Field::Decisions => "decisions",
            Field::Recommendations => "recommendations",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Field::Summary => "string, three sentences at most",
            Field::Steps => {
                "ordered list of {\"name\", \"description\", \"actor\", \"department\", \
                 \"type\": \"start\"|\"task\"|\"decision\"|\"end\", \
                 \"options\": [{\"label\", \"next\"}]}. Step names must be unique; \
                 \"next\" must repeat the exact name of another step. Only decisions carry options"
            }
            Field::Organization => {
                "list of {\"name\", \"type\": \"group\"|\"company\"|\"plant\"|\"department\"|\
                 \"team\"|\"warehouse\"|\"site\", \"parent\": name of another node or null}. \
                 Names must be unique and exactly one node has a null parent"
            }
            Field::Participants => {
                "list of {\"name\", \"role\", \"department\", \"responsibilities\": [string], \
                 \"pain_points\": [string], \"influence\": \"high\"|\"medium\"|\"low\"}"
            }
            Field::Actors => "list of strings, roles involved",
            Field::Inputs => "list of strings, documents or data entering the process",
            Field::Outputs => "list of strings, results leaving the process",
            Field::Pains => "list of strings, problems or observations",
            Field::Kpis => "list of strings, measurable indicators mentioned or implied",
            Field::Decisions => "list of strings, decisions taken during the workshop",
            Field::Recommendations => "list of strings, concrete improvement actions",
        }
    }
}

pub const SYSTEM_PROMPT: &str = "You are an expert business-process analyst. \
You read workshop transcripts and answer with a single JSON object only: \
no markdown, no commentary before or after it.";

/// Builds the instruction for one schema from the shared field catalogue.
pub fn instruction(schema: SchemaKind, language: Language) -> String {
    let mut out = String::from(SYSTEM_PROMPT);
    out.push_str("\n\nReturn a JSON object with exactly these keys:\n");
    for field in schema.fields() {
        out.push_str(&format!("- \"{}\": {}\n", field.key(), field.describe()));
    }
    out.push_str(&format!(
        "\nUse empty lists when the transcript says nothing about a key. \
         Keep keys in English and write every free-text value in {}. \
         Do not invent people or steps that the transcript does not mention.",
        language.name()
    ));
    out
}

pub fn user_prompt(transcript: &str) -> String {
    format!("Workshop transcript:\n\"\"\"\n{transcript}\n\"\"\"\n\nReturn the JSON object.")
}
