use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::analysis::model::AnalysisResult;

/// How the raw completion text was turned into an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RecoveryStatus {
    Parsed,
    NoJsonFound,
    /// A `{` was found but its matching `}` never appeared (truncated output).
    Unbalanced,
    Malformed(String),
}

impl RecoveryStatus {
    pub fn is_parsed(&self) -> bool {
        matches!(self, RecoveryStatus::Parsed)
    }

    pub fn describe(&self) -> String {
        match self {
            RecoveryStatus::Parsed => "parsed".to_string(),
            RecoveryStatus::NoJsonFound => "no JSON object found in model output".to_string(),
            RecoveryStatus::Unbalanced => "JSON object in model output is not closed".to_string(),
            RecoveryStatus::Malformed(err) => format!("JSON parse error: {err}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recovered {
    pub result: AnalysisResult,
    pub status: RecoveryStatus,
    /// Untouched model output, kept for manual inspection.
    pub raw: String,
}

/// Pulls the first balanced JSON object out of free text and deserializes it.
///
/// A balanced span that does not parse (`{name}` in prose, say) is skipped and the
/// search resumes after it; the first failure is reported if nothing parses.
///
/// Never fails: anything that does not yield an object comes back as
/// `AnalysisResult::default()` with a status saying why.
pub fn recover(raw: &str) -> Recovered {
    let (result, status) = first_parsable(raw);

    if status.is_parsed() {
        debug!(
            steps = result.steps.len(),
            org = result.organization.len(),
            "recovered analysis JSON"
        );
    } else {
        let snippet: String = raw.chars().take(100).collect();
        warn!(status = %status.describe(), snippet = %snippet, "falling back to empty analysis");
    }

    Recovered {
        result,
        status,
        raw: raw.to_string(),
    }
}

const MAX_CANDIDATES: usize = 16;

fn first_parsable(raw: &str) -> (AnalysisResult, RecoveryStatus) {
    let mut first_error = None;
    let mut from = 0;

    for _ in 0..MAX_CANDIDATES {
        let (start, end) = match object_span(raw, from) {
            Ok(span) => span,
            Err(status) => {
                return (AnalysisResult::default(), first_error.unwrap_or(status));
            }
        };
        match parse_span(&raw[start..end]) {
            Ok(result) => return (result, RecoveryStatus::Parsed),
            Err(err) => {
                debug!(start, error = %err, "skipping unparsable span");
                first_error.get_or_insert(RecoveryStatus::Malformed(err));
                from = end;
            }
        }
    }
    (
        AnalysisResult::default(),
        first_error.unwrap_or(RecoveryStatus::NoJsonFound),
    )
}

/// Finds the span from the first `{` to the `}` that balances it.
/// Braces inside string literals do not count.
pub fn extract_object(raw: &str) -> Result<&str, RecoveryStatus> {
    object_span(raw, 0).map(|(start, end)| &raw[start..end])
}

/// Byte range of the first balanced object at or after `from`.
fn object_span(raw: &str, from: usize) -> Result<(usize, usize), RecoveryStatus> {
    let start = raw[from..]
        .find('{')
        .map(|i| from + i)
        .ok_or(RecoveryStatus::NoJsonFound)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in raw[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((start, start + offset + 1));
                }
            }
            _ => {}
        }
    }
    Err(RecoveryStatus::Unbalanced)
}

fn parse_span(span: &str) -> Result<AnalysisResult, String> {
    let value: Value = serde_json::from_str(span).map_err(|e| e.to_string())?;
    let Value::Object(root) = value else {
        return Err("top-level value is not an object".to_string());
    };
    let canonical = canonicalize(root);
    serde_json::from_value(Value::Object(canonical)).map_err(|e| e.to_string())
}

const TEXT_LISTS: [&str; 7] = [
    "actors",
    "inputs",
    "outputs",
    "pains",
    "recommendations",
    "kpis",
    "decisions",
];

const RECORD_TEXT_LISTS: [&str; 2] = ["responsibilities", "pain_points"];

/// Rewrites the nested and flat schema shapes into the canonical one.
fn canonicalize(mut root: Map<String, Value>) -> Map<String, Value> {
    // {"process": {"steps": [...]}} or {"process": [...]}
    if let Some(process) = root.remove("process") {
        let steps = match process {
            Value::Object(mut obj) => obj.remove("steps"),
            list @ Value::Array(_) => Some(list),
            _ => None,
        };
        if let Some(steps) = steps {
            root.entry("steps").or_insert(steps);
        }
    }

    if let Some(org) = root.remove("organization") {
        let nodes = match org {
            Value::Object(mut obj) => obj
                .remove("nodes")
                .or_else(|| obj.remove("units"))
                .unwrap_or(Value::Array(Vec::new())),
            other => other,
        };
        root.insert("organization".to_string(), nodes);
    }

    if let Some(summary) = root.remove("summary") {
        if let Some(text) = value_to_text(&summary) {
            root.insert("summary".to_string(), Value::String(text));
        }
    }

    let steps = take_list(&mut root, "steps");
    root.insert(
        "steps".to_string(),
        Value::Array(
            steps
                .into_iter()
                .filter_map(|step| match step {
                    Value::String(name) => Some(object_with("name", name)),
                    Value::Object(obj) => Some(Value::Object(clean_record(obj))),
                    _ => None,
                })
                .collect(),
        ),
    );

    for key in ["organization", "participants"] {
        let items = take_list(&mut root, key);
        root.insert(
            key.to_string(),
            Value::Array(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(name) => Some(object_with("name", name)),
                        Value::Object(obj) => Some(Value::Object(clean_record(obj))),
                        _ => None,
                    })
                    .collect(),
            ),
        );
    }

    for key in TEXT_LISTS {
        let items = take_list(&mut root, key);
        root.insert(key.to_string(), text_list(items));
    }

    root
}

/// Removes a key and returns it as a list; a lone scalar becomes a one-item list.
fn take_list(root: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match root.remove(key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

fn object_with(key: &str, value: String) -> Value {
    let mut obj = Map::new();
    obj.insert(key.to_string(), Value::String(value));
    Value::Object(obj)
}

/// Drops nulls, stringifies scalars, and normalizes the list fields of a record.
fn clean_record(obj: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in obj {
        let cleaned = match value {
            Value::Null => continue,
            value if key == "options" || key == "opciones" => match branch_options(value) {
                Some(options) => options,
                None => continue,
            },
            Value::Array(items) if RECORD_TEXT_LISTS.contains(&key.as_str()) => text_list(items),
            value if RECORD_TEXT_LISTS.contains(&key.as_str()) => match value_to_text(&value) {
                Some(text) => Value::Array(vec![Value::String(text)]),
                None => continue,
            },
            Value::Bool(b) => Value::String(b.to_string()),
            Value::Number(n) => Value::String(n.to_string()),
            // Scalar fields that came back as lists or objects collapse to text.
            Value::Array(items) => Value::String(
                items
                    .iter()
                    .filter_map(value_to_text)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            obj @ Value::Object(_) => match value_to_text(&obj) {
                Some(text) => Value::String(text),
                None => continue,
            },
            other => other,
        };
        out.insert(key, cleaned);
    }
    out
}

/// Options may come back as a list, a single object, or one bare label.
fn branch_options(value: Value) -> Option<Value> {
    let option = |value: Value| match value {
        Value::String(label) => {
            (!label.trim().is_empty()).then(|| object_with("label", label))
        }
        Value::Object(o) => Some(Value::Object(clean_record(o))),
        _ => None,
    };
    match value {
        Value::Array(items) => Some(Value::Array(items.into_iter().filter_map(option).collect())),
        single @ (Value::String(_) | Value::Object(_)) => {
            option(single).map(|o| Value::Array(vec![o]))
        }
        _ => None,
    }
}

fn text_list(items: Vec<Value>) -> Value {
    Value::Array(
        items
            .iter()
            .filter_map(value_to_text)
            .map(Value::String)
            .collect(),
    )
}

/// Best-effort text for a free-text list entry.
fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => {
            for key in ["description", "name", "text", "title", "value", "descripcion", "nombre"] {
                if let Some(Value::String(s)) = obj.get(key) {
                    if !s.trim().is_empty() {
                        return Some(s.trim().to_string());
                    }
                }
            }
            serde_json::to_string(value).ok()
        }
        Value::Array(_) => serde_json::to_string(value).ok(),
    }
}
