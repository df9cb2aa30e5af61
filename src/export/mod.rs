//! Tabular views of an analysis and the files written for download.

pub mod report;
pub mod table;

use serde::Serialize;

use crate::analysis::AnalysisResult;

pub use report::{html_report, markdown_report, write_workbook};
pub use table::render_table;

/// A list of uniform records, one per exported sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// One sheet per non-empty list in the analysis.
pub fn sheets(result: &AnalysisResult) -> Vec<Sheet> {
    let mut out = Vec::new();

    if !result.steps.is_empty() {
        out.push(Sheet {
            name: "steps",
            headers: vec!["#", "name", "type", "department", "actor", "description", "options"],
            rows: result
                .steps
                .iter()
                .enumerate()
                .map(|(i, step)| {
                    let options = step
                        .options
                        .iter()
                        .map(|o| match o.next.as_deref() {
                            Some(next) => format!("{} -> {next}", o.label),
                            None => o.label.clone(),
                        })
                        .collect::<Vec<_>>()
                        .join("; ");
                    vec![
                        (i + 1).to_string(),
                        step.name.clone(),
                        step.step_type.as_str().to_string(),
                        step.department.clone().unwrap_or_default(),
                        step.actor.clone().unwrap_or_default(),
                        step.description.clone().unwrap_or_default(),
                        options,
                    ]
                })
                .collect(),
        });
    }

    if !result.organization.is_empty() {
        out.push(Sheet {
            name: "organization",
            headers: vec!["name", "type", "parent"],
            rows: result
                .organization
                .iter()
                .map(|node| {
                    vec![
                        node.name.clone(),
                        node.node_type.to_string(),
                        node.parent.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        });
    }

    if !result.participants.is_empty() {
        out.push(Sheet {
            name: "participants",
            headers: vec![
                "name",
                "role",
                "department",
                "responsibilities",
                "pain_points",
                "influence",
            ],
            rows: result
                .participants
                .iter()
                .map(|p| {
                    vec![
                        p.name.clone(),
                        p.role.clone(),
                        p.department.clone().unwrap_or_default(),
                        p.responsibilities.join("; "),
                        p.pain_points.join("; "),
                        p.influence.clone().unwrap_or_default(),
                    ]
                })
                .collect(),
        });
    }

    let lists: [(&'static str, &Vec<String>); 7] = [
        ("pains", &result.pains),
        ("recommendations", &result.recommendations),
        ("kpis", &result.kpis),
        ("decisions", &result.decisions),
        ("actors", &result.actors),
        ("inputs", &result.inputs),
        ("outputs", &result.outputs),
    ];
    for (name, items) in lists {
        if items.is_empty() {
            continue;
        }
        out.push(Sheet {
            name,
            headers: vec!["#", name],
            rows: items
                .iter()
                .enumerate()
                .map(|(i, item)| vec![(i + 1).to_string(), item.clone()])
                .collect(),
        });
    }

    out
}
