use std::collections::{HashMap, VecDeque};

use crate::analysis::model::{OrgNode, OrgNodeType};
use crate::diagram::sanitize::label_or;

pub const SYNTHETIC_ROOT: &str = "Organization";
pub const ROOT_ID: &str = "ROOT";

const CLASS_DEFS: [&str; 9] = [
    "classDef rootNode fill:#111827,stroke:#111827,color:#f9fafb",
    "classDef groupNode fill:#ede9fe,stroke:#7c3aed,color:#2e1065",
    "classDef companyNode fill:#dbeafe,stroke:#2563eb,color:#172554",
    "classDef plantNode fill:#dcfce7,stroke:#16a34a,color:#052e16",
    "classDef departmentNode fill:#fef9c3,stroke:#ca8a04,color:#422006",
    "classDef teamNode fill:#ffedd5,stroke:#ea580c,color:#431407",
    "classDef warehouseNode fill:#e0f2fe,stroke:#0284c7,color:#082f49",
    "classDef siteNode fill:#fce7f3,stroke:#db2777,color:#500724",
    "classDef otherNode fill:#f3f4f6,stroke:#6b7280,color:#111827",
];

pub fn node_id(index: usize) -> String {
    format!("N{index}")
}

fn class_name(node_type: &OrgNodeType) -> &'static str {
    match node_type {
        OrgNodeType::Group => "groupNode",
        OrgNodeType::Company => "companyNode",
        OrgNodeType::Plant => "plantNode",
        OrgNodeType::Department => "departmentNode",
        OrgNodeType::Team => "teamNode",
        OrgNodeType::Warehouse => "warehouseNode",
        OrgNodeType::Site => "siteNode",
        OrgNodeType::Other(_) => "otherNode",
    }
}

/// Parent of every node after repair. `None` in `parents` means "hangs off the
/// synthetic root" when `synthetic_root` is set, or "is the single root" otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgTree {
    pub parents: Vec<Option<usize>>,
    pub synthetic_root: Option<String>,
}

/// Repairs the parent graph into a single tree.
///
/// With no explicit root, every node is attached directly to a synthetic root.
/// Otherwise unknown parents are dropped, cycles are cut at their first node in
/// list order, and a synthetic root is added only if several roots remain.
pub fn resolve_tree(nodes: &[OrgNode]) -> OrgTree {
    let has_explicit_root = nodes.iter().any(|n| n.parent.is_none());
    if !has_explicit_root {
        return OrgTree {
            parents: vec![None; nodes.len()],
            synthetic_root: (!nodes.is_empty()).then(|| root_name(nodes)),
        };
    }

    let mut by_name: HashMap<&str, usize> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        by_name.entry(node.name.trim()).or_insert(index);
    }

    let mut parents: Vec<Option<usize>> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let parent = node.parent.as_deref()?.trim();
            by_name.get(parent).copied().filter(|p| *p != index)
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (index, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            children[*parent].push(index);
        }
    }

    let mut reached = vec![false; nodes.len()];
    for index in 0..nodes.len() {
        if parents[index].is_none() {
            mark_subtree(index, &children, &mut reached);
        }
    }
    // Whatever is still unreached is on a cycle or hangs below one.
    for index in 0..nodes.len() {
        if reached[index] {
            continue;
        }
        let cut = cycle_member(index, &parents);
        if let Some(parent) = parents[cut].take() {
            children[parent].retain(|c| *c != cut);
        }
        mark_subtree(cut, &children, &mut reached);
    }

    let roots = parents.iter().filter(|p| p.is_none()).count();
    OrgTree {
        parents,
        synthetic_root: (roots > 1).then(|| root_name(nodes)),
    }
}

/// Walks up from `start` until a node repeats and returns the lowest index on
/// that cycle.
fn cycle_member(start: usize, parents: &[Option<usize>]) -> usize {
    let mut path = vec![start];
    let mut current = start;
    while let Some(parent) = parents[current] {
        if let Some(pos) = path.iter().position(|n| *n == parent) {
            return path[pos..].iter().copied().min().unwrap_or(parent);
        }
        path.push(parent);
        current = parent;
    }
    // Reached a root instead of a cycle.
    current
}

fn mark_subtree(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut queue = VecDeque::from([start]);
    while let Some(index) = queue.pop_front() {
        if reached[index] {
            continue;
        }
        reached[index] = true;
        queue.extend(children[index].iter().copied());
    }
}

fn root_name(nodes: &[OrgNode]) -> String {
    let taken = |candidate: &str| nodes.iter().any(|n| n.name.trim() == candidate);
    if !taken(SYNTHETIC_ROOT) {
        return SYNTHETIC_ROOT.to_string();
    }
    (2..)
        .map(|n| format!("{SYNTHETIC_ROOT} {n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| SYNTHETIC_ROOT.to_string())
}

/// Renders org nodes as a top-down Mermaid graph that is always a single tree.
pub fn build_org_diagram(nodes: &[OrgNode]) -> String {
    let mut lines = vec!["graph TD".to_string()];
    lines.extend(CLASS_DEFS.iter().map(|def| format!("    {def}")));

    let tree = resolve_tree(nodes);

    if let Some(root) = &tree.synthetic_root {
        let label = label_or(root, || SYNTHETIC_ROOT.to_string());
        lines.push(format!("    {ROOT_ID}[\"{label}\"]:::rootNode"));
    }

    for (index, node) in nodes.iter().enumerate() {
        let label = label_or(&node.name, || format!("Node {}", index + 1));
        lines.push(format!(
            "    {}[\"{label}\"]:::{}",
            node_id(index),
            class_name(&node.node_type)
        ));
    }

    for (index, parent) in tree.parents.iter().enumerate() {
        match parent {
            Some(parent) => lines.push(format!("    {} --> {}", node_id(*parent), node_id(index))),
            None if tree.synthetic_root.is_some() => {
                lines.push(format!("    {ROOT_ID} --> {}", node_id(index)))
            }
            None => {}
        }
    }

    lines.join("\n")
}
