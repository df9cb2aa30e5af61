//! One analysis action: preprocess, extract, recover, validate, draw.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::{self, merge_speakers, Recovered, ValidationIssue};
use crate::diagram::{build_org_diagram, build_process_diagram};
use crate::llm::{CompletionBackend, ExtractionClient, Language, SchemaKind};
use crate::transcript;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DiagramOutcome {
    Rendered(String),
    /// Not drawn because name references were ambiguous.
    Withheld(String),
    /// Nothing to draw.
    Empty,
}

impl DiagramOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            DiagramOutcome::Rendered(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub schema: SchemaKind,
    pub language: Language,
    pub model: String,
    pub speakers: BTreeSet<String>,
    pub recovered: Recovered,
    pub issues: Vec<ValidationIssue>,
    pub process_diagram: DiagramOutcome,
    pub org_diagram: DiagramOutcome,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Completed(Box<AnalysisRecord>),
    EmptyInput,
    /// Both models failed; nothing to show for this action.
    Unavailable { reason: String },
}

pub struct Pipeline<B> {
    client: ExtractionClient<B>,
}

impl<B: CompletionBackend> Pipeline<B> {
    pub fn new(client: ExtractionClient<B>) -> Self {
        Self { client }
    }

    /// Runs one full analysis. Every failure is folded into the outcome.
    pub fn analyze(&self, schema: SchemaKind, language: Language, text: &str) -> AnalysisOutcome {
        if text.trim().is_empty() {
            return AnalysisOutcome::EmptyInput;
        }

        let prepared = transcript::preprocess(text);
        info!(speakers = prepared.speakers.len(), "transcript preprocessed");

        let extraction = match self.client.extract(schema, language, &prepared.cleaned_text) {
            Ok(extraction) => extraction,
            Err(err) => {
                warn!(error = %err, "analysis unavailable");
                return AnalysisOutcome::Unavailable {
                    reason: err.to_string(),
                };
            }
        };

        let mut warnings = extraction.warnings;
        let mut recovered = analysis::recover(&extraction.raw_text);
        if !recovered.status.is_parsed() {
            warnings.push(format!(
                "{}; showing raw model output",
                recovered.status.describe()
            ));
        }

        let added = merge_speakers(&mut recovered.result.participants, &prepared.speakers);
        if added > 0 {
            info!(added, "speakers added to participants");
        }

        let issues = analysis::validate(&recovered.result);
        for issue in &issues {
            warn!(%issue, "validation issue");
        }

        let process_diagram = draw(
            recovered.result.steps.is_empty(),
            issues
                .iter()
                .find(|i| matches!(i, ValidationIssue::DuplicateStepName { .. })),
            || build_process_diagram(&recovered.result.steps),
        );
        let org_diagram = draw(
            recovered.result.organization.is_empty(),
            issues
                .iter()
                .find(|i| matches!(i, ValidationIssue::DuplicateOrgNode { .. })),
            || build_org_diagram(&recovered.result.organization),
        );

        AnalysisOutcome::Completed(Box::new(AnalysisRecord {
            schema,
            language,
            model: extraction.model,
            speakers: prepared.speakers,
            recovered,
            issues,
            process_diagram,
            org_diagram,
            warnings,
        }))
    }
}

fn draw(
    empty: bool,
    blocking: Option<&ValidationIssue>,
    build: impl FnOnce() -> String,
) -> DiagramOutcome {
    match (empty, blocking) {
        (true, _) => DiagramOutcome::Empty,
        (false, Some(issue)) => DiagramOutcome::Withheld(issue.to_string()),
        (false, None) => DiagramOutcome::Rendered(build()),
    }
}
