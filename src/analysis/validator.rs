use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::analysis::model::AnalysisResult;

/// Problems with the name-keyed references in an extracted analysis.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("step name '{name}' is used more than once")]
    DuplicateStepName { name: String },

    #[error("org node '{name}' is declared more than once")]
    DuplicateOrgNode { name: String },

    #[error("step '{step}' branches to unknown step '{target}'")]
    UnresolvedBranch { step: String, target: String },

    #[error("org node '{node}' points at unknown parent '{parent}'")]
    DanglingParent { node: String, parent: String },

    #[error("org node '{node}' is part of a parent cycle")]
    ParentCycle { node: String },
}

impl ValidationIssue {
    /// Duplicate keys make edges ambiguous; everything else is drawn around.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            ValidationIssue::DuplicateStepName { .. } | ValidationIssue::DuplicateOrgNode { .. }
        )
    }
}

pub fn validate(analysis: &AnalysisResult) -> Vec<ValidationIssue> {
    let mut issues = validate_steps(analysis);
    issues.extend(validate_organization(analysis));
    issues
}

pub fn validate_steps(analysis: &AnalysisResult) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut names = HashSet::new();
    let mut reported = HashSet::new();

    for step in &analysis.steps {
        let name = step.name.trim();
        if name.is_empty() {
            continue;
        }
        if !names.insert(name) && reported.insert(name) {
            issues.push(ValidationIssue::DuplicateStepName {
                name: name.to_string(),
            });
        }
    }

    for step in &analysis.steps {
        for option in &step.options {
            let Some(target) = option.next.as_deref().map(str::trim) else {
                continue;
            };
            if !target.is_empty() && !names.contains(target) {
                issues.push(ValidationIssue::UnresolvedBranch {
                    step: step.name.trim().to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    issues
}

pub fn validate_organization(analysis: &AnalysisResult) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
    let mut reported = HashSet::new();

    for node in &analysis.organization {
        let name = node.name.trim();
        if name.is_empty() {
            continue;
        }
        if parents.contains_key(name) {
            if reported.insert(name) {
                issues.push(ValidationIssue::DuplicateOrgNode {
                    name: name.to_string(),
                });
            }
            continue;
        }
        parents.insert(name, node.parent.as_deref().map(str::trim));
    }

    for node in &analysis.organization {
        let name = node.name.trim();
        if let Some(parent) = node.parent.as_deref().map(str::trim) {
            if !parent.is_empty() && !parents.contains_key(parent) {
                issues.push(ValidationIssue::DanglingParent {
                    node: name.to_string(),
                    parent: parent.to_string(),
                });
            }
        }
    }

    // Walk each chain; a node that reaches itself sits on a cycle.
    let mut on_cycle = HashSet::new();
    for node in &analysis.organization {
        let start = node.name.trim();
        if start.is_empty() || on_cycle.contains(start) {
            continue;
        }
        let mut seen = HashSet::new();
        let mut current = start;
        while let Some(Some(parent)) = parents.get(current) {
            if *parent == start {
                on_cycle.insert(start);
                issues.push(ValidationIssue::ParentCycle {
                    node: start.to_string(),
                });
                break;
            }
            if !seen.insert(*parent) {
                break;
            }
            current = *parent;
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{OrgNode, OrgNodeType, ProcessStep, StepType};

    fn analysis_with_steps(steps: Vec<ProcessStep>) -> AnalysisResult {
        AnalysisResult {
            steps,
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn clean_analysis_has_no_issues() {
        let analysis = analysis_with_steps(vec![
            ProcessStep::new("Start", StepType::Start),
            ProcessStep::new("Check", StepType::Decision).with_option("ok", "Ship"),
            ProcessStep::new("Ship", StepType::End),
        ]);
        assert!(validate(&analysis).is_empty());
    }

    #[test]
    fn duplicate_step_reported_once() {
        let analysis = analysis_with_steps(vec![
            ProcessStep::new("Review", StepType::Task),
            ProcessStep::new("Review", StepType::Task),
            ProcessStep::new(" Review ", StepType::Task),
        ]);
        let issues = validate(&analysis);
        assert_eq!(
            issues,
            vec![ValidationIssue::DuplicateStepName {
                name: "Review".into()
            }]
        );
        assert!(issues[0].is_blocking());
    }

    #[test]
    fn unresolved_branch_is_not_blocking() {
        let analysis = analysis_with_steps(vec![
            ProcessStep::new("Check", StepType::Decision).with_option("no", "Escalate"),
        ]);
        let issues = validate(&analysis);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_blocking());
    }

    #[test]
    fn org_dangling_parent_and_cycle() {
        let analysis = AnalysisResult {
            organization: vec![
                OrgNode::new("A", OrgNodeType::Company, Some("B")),
                OrgNode::new("B", OrgNodeType::Plant, Some("A")),
                OrgNode::new("C", OrgNodeType::Team, Some("Ghost")),
            ],
            ..AnalysisResult::default()
        };
        let issues = validate(&analysis);
        assert!(issues.contains(&ValidationIssue::DanglingParent {
            node: "C".into(),
            parent: "Ghost".into()
        }));
        assert!(issues.contains(&ValidationIssue::ParentCycle { node: "A".into() }));
        assert!(issues.contains(&ValidationIssue::ParentCycle { node: "B".into() }));
    }

    #[test]
    fn duplicate_org_node() {
        let analysis = AnalysisResult {
            organization: vec![
                OrgNode::new("Ops", OrgNodeType::Department, None),
                OrgNode::new("Ops", OrgNodeType::Team, Some("Ops")),
            ],
            ..AnalysisResult::default()
        };
        let issues = validate_organization(&analysis);
        assert_eq!(issues[0], ValidationIssue::DuplicateOrgNode { name: "Ops".into() });
    }
}
