use std::collections::HashMap;

use crate::analysis::model::{ProcessStep, StepType};
use crate::diagram::sanitize::{label_or, sanitize_label};

/// Lane used for steps without a department.
pub const DEFAULT_LANE: &str = "General";

// `end` is a Mermaid keyword, so class names carry a suffix.
const CLASS_DEFS: [&str; 4] = [
    "classDef startStep fill:#d1fae5,stroke:#059669,color:#064e3b",
    "classDef taskStep fill:#e0e7ff,stroke:#4f46e5,color:#1e1b4b",
    "classDef decisionStep fill:#fef3c7,stroke:#d97706,color:#78350f",
    "classDef endStep fill:#fee2e2,stroke:#dc2626,color:#7f1d1d",
];

const BRANCH_COLORS: [&str; 4] = ["#2563eb", "#dc2626", "#16a34a", "#9333ea"];

pub fn node_id(index: usize) -> String {
    format!("S{index}")
}

fn class_name(step_type: StepType) -> &'static str {
    match step_type {
        StepType::Start => "startStep",
        StepType::Task => "taskStep",
        StepType::Decision => "decisionStep",
        StepType::End => "endStep",
    }
}

fn declaration(index: usize, step: &ProcessStep) -> String {
    let label = label_or(&step.name, || format!("Step {}", index + 1));
    let id = node_id(index);
    let class = class_name(step.step_type);
    match step.step_type {
        StepType::Start | StepType::End => format!("{id}([\"{label}\"]):::{class}"),
        StepType::Decision => format!("{id}{{\"{label}\"}}:::{class}"),
        StepType::Task => format!("{id}[\"{label}\"]:::{class}"),
    }
}

fn lane_of(step: &ProcessStep) -> &str {
    match step.department.as_deref().map(str::trim) {
        Some(dept) if !dept.is_empty() => dept,
        _ => DEFAULT_LANE,
    }
}

/// Renders steps as a Mermaid flowchart with one lane per department.
///
/// Steps are chained in list order; a dashed edge marks a department hand-off.
/// When a step lists branch options whose `next` names another step, those
/// labelled, coloured edges replace its sequential edge. Unresolvable
/// targets are skipped.
pub fn build_process_diagram(steps: &[ProcessStep]) -> String {
    let mut lines = vec!["flowchart TD".to_string()];
    lines.extend(CLASS_DEFS.iter().map(|def| format!("    {def}")));

    let mut lanes: Vec<&str> = Vec::new();
    for step in steps {
        let lane = lane_of(step);
        if !lanes.contains(&lane) {
            lanes.push(lane);
        }
    }

    for (lane_index, lane) in lanes.iter().enumerate() {
        let title = label_or(lane, || DEFAULT_LANE.to_string());
        lines.push(format!("    subgraph lane_{lane_index}[\"{title}\"]"));
        for (index, step) in steps.iter().enumerate() {
            if lane_of(step) == *lane {
                lines.push(format!("        {}", declaration(index, step)));
            }
        }
        lines.push("    end".to_string());
    }

    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (index, step) in steps.iter().enumerate() {
        by_name.entry(step.name.trim()).or_insert(index);
    }

    let mut edge_count = 0usize;
    let mut link_styles = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let branches: Vec<(String, usize)> = step
            .options
            .iter()
            .filter_map(|option| {
                let target = option
                    .next
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())?;
                let target_index = *by_name.get(target)?;
                Some((sanitize_label(&option.label), target_index))
            })
            .collect();

        if branches.is_empty() {
            if index + 1 < steps.len() {
                let arrow = if lane_of(step) == lane_of(&steps[index + 1]) {
                    "-->"
                } else {
                    "-.->"
                };
                lines.push(format!("    {} {arrow} {}", node_id(index), node_id(index + 1)));
                edge_count += 1;
            }
            continue;
        }

        for (branch_index, (label, target)) in branches.iter().enumerate() {
            let edge = if label.is_empty() {
                format!("    {} --> {}", node_id(index), node_id(*target))
            } else {
                format!("    {} -->|\"{label}\"| {}", node_id(index), node_id(*target))
            };
            lines.push(edge);
            let color = BRANCH_COLORS[branch_index % BRANCH_COLORS.len()];
            link_styles.push(format!("    linkStyle {edge_count} stroke:{color},stroke-width:2px"));
            edge_count += 1;
        }
    }

    lines.extend(link_styles);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_declarations(diagram: &str, id: &str) -> usize {
        diagram
            .lines()
            .map(str::trim)
            .filter(|line| {
                line.starts_with(id)
                    && line[id.len()..].starts_with(|c: char| c == '[' || c == '(' || c == '{')
            })
            .count()
    }

    #[test]
    fn single_step_has_no_edges() {
        let diagram = build_process_diagram(&[ProcessStep::new("Only", StepType::Start)]);
        assert!(diagram.contains("S0([\"Only\"]):::startStep"));
        assert!(!diagram.contains("-->"));
        assert!(diagram.contains("subgraph lane_0[\"General\"]"));
    }

    #[test]
    fn lanes_follow_first_seen_department_order() {
        let steps = vec![
            ProcessStep::new("Order", StepType::Start).in_department("Sales"),
            ProcessStep::new("Pick", StepType::Task).in_department("Warehouse"),
            ProcessStep::new("Invoice", StepType::Task).in_department("Sales"),
        ];
        let diagram = build_process_diagram(&steps);
        let sales = diagram.find("lane_0[\"Sales\"]").unwrap();
        let warehouse = diagram.find("lane_1[\"Warehouse\"]").unwrap();
        assert!(sales < warehouse);
        assert!(diagram.contains("S0 -.-> S1"));
        assert!(diagram.contains("S1 -.-> S2"));
    }

    #[test]
    fn same_lane_edges_are_solid() {
        let steps = vec![
            ProcessStep::new("A", StepType::Start).in_department("Ops"),
            ProcessStep::new("B", StepType::End).in_department(" Ops "),
        ];
        let diagram = build_process_diagram(&steps);
        assert!(diagram.contains("S0 --> S1"));
        assert!(diagram.contains("S1([\"B\"]):::endStep"));
    }

    #[test]
    fn branch_options_replace_sequential_edge() {
        let steps = vec![
            ProcessStep::new("Check stock", StepType::Decision)
                .with_option("in stock", "Ship")
                .with_option("missing", "Reorder"),
            ProcessStep::new("Reorder", StepType::Task),
            ProcessStep::new("Ship", StepType::End),
        ];
        let diagram = build_process_diagram(&steps);
        assert!(diagram.contains("S0{\"Check stock\"}:::decisionStep"));
        assert!(diagram.contains("S0 -->|\"in stock\"| S2"));
        assert!(diagram.contains("S0 -->|\"missing\"| S1"));
        assert!(!diagram.contains("S0 --> S1\n"));
        assert!(diagram.contains("S1 --> S2"));
        assert!(diagram.contains("linkStyle 0 stroke:#2563eb"));
        assert!(diagram.contains("linkStyle 1 stroke:#dc2626"));
    }

    #[test]
    fn unresolved_branches_fall_back_to_sequence() {
        let steps = vec![
            ProcessStep::new("Check", StepType::Decision).with_option("yes", "Nowhere"),
            ProcessStep::new("Next", StepType::Task),
        ];
        let diagram = build_process_diagram(&steps);
        assert!(diagram.contains("S0 --> S1"));
        assert!(!diagram.contains("linkStyle"));
    }

    #[test]
    fn every_node_declared_exactly_once() {
        let steps = vec![
            ProcessStep::new("\"quoted\"\nname", StepType::Task),
            ProcessStep::default(),
            ProcessStep::new("C", StepType::End).in_department("X"),
        ];
        let diagram = build_process_diagram(&steps);
        for index in 0..steps.len() {
            assert_eq!(count_declarations(&diagram, &node_id(index)), 1, "{diagram}");
        }
        assert!(diagram.contains("S0[\"quoted name\"]"));
        assert!(diagram.contains("S1[\"Step 2\"]:::taskStep"));
    }

    #[test]
    fn empty_list_is_still_a_flowchart() {
        let diagram = build_process_diagram(&[]);
        assert!(diagram.starts_with("flowchart TD"));
        assert!(!diagram.contains("subgraph"));
    }
}
