use tracing::debug;

use crate::llm::{Language, SchemaKind};
use crate::pipeline::{AnalysisOutcome, AnalysisRecord};

/// Per-session state: preferences plus the result of the latest analysis.
///
/// Each analysis replaces the previous record wholesale; nothing outlives the
/// session.
#[derive(Debug, Default)]
pub struct Session {
    pub language: Language,
    pub schema: SchemaKind,
    last: Option<AnalysisRecord>,
    analyses: u64,
}

impl Session {
    pub fn new(language: Language, schema: SchemaKind) -> Self {
        Self {
            language,
            schema,
            last: None,
            analyses: 0,
        }
    }

    pub fn last(&self) -> Option<&AnalysisRecord> {
        self.last.as_ref()
    }

    pub fn analyses(&self) -> u64 {
        self.analyses
    }

    pub fn replace(&mut self, record: AnalysisRecord) -> Option<AnalysisRecord> {
        self.analyses += 1;
        debug!(seq = self.analyses, "session record replaced");
        self.last.replace(record)
    }

    /// Stores the outcome of one action. Anything other than a completed
    /// analysis clears the previous record so stale results are not exported.
    pub fn apply(&mut self, outcome: &AnalysisOutcome) {
        match outcome {
            AnalysisOutcome::Completed(record) => {
                self.replace(record.as_ref().clone());
            }
            AnalysisOutcome::Unavailable { .. } => {
                self.analyses += 1;
                self.last = None;
            }
            AnalysisOutcome::EmptyInput => {}
        }
    }
}
