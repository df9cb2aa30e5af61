//! Canonical analysis schema, recovery from raw model text, and ingestion checks.

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{
    merge_speakers, AnalysisResult, BranchOption, OrgNode, OrgNodeType, Participant, ProcessStep,
    StepType,
};
pub use parser::{recover, Recovered, RecoveryStatus};
pub use validator::{validate, ValidationIssue};
