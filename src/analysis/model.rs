use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Root object the extraction model is asked to produce.
///
/// Covers the union of the flat (`steps`/`actors`/`inputs`/`outputs`/`pains`),
/// nested (`organization`/`process`/`participants`) and pro (`kpis`/`decisions`/
/// `recommendations`) shapes. Every field defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub steps: Vec<ProcessStep>,
    pub organization: Vec<OrgNode>,
    pub participants: Vec<Participant>,
    pub actors: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub pains: Vec<String>,
    pub recommendations: Vec<String>,
    pub kpis: Vec<String>,
    pub decisions: Vec<String>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.steps.is_empty()
            && self.organization.is_empty()
            && self.participants.is_empty()
            && self.actors.is_empty()
            && self.inputs.is_empty()
            && self.outputs.is_empty()
            && self.pains.is_empty()
            && self.recommendations.is_empty()
            && self.kpis.is_empty()
            && self.decisions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "descripcion")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "responsable")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "departamento")]
    pub department: Option<String>,
    #[serde(rename = "type", default, alias = "tipo")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "opciones")]
    pub options: Vec<BranchOption>,
}

impl ProcessStep {
    pub fn new(name: impl Into<String>, step_type: StepType) -> Self {
        Self {
            name: name.into(),
            step_type,
            ..Self::default()
        }
    }

    pub fn in_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_option(mut self, label: impl Into<String>, next: impl Into<String>) -> Self {
        self.options.push(BranchOption {
            label: label.into(),
            next: Some(next.into()),
        });
        self
    }
}

/// An explicit branch out of a step, referencing the target by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchOption {
    #[serde(default, alias = "etiqueta")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "siguiente")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum StepType {
    Start,
    #[default]
    Task,
    Decision,
    End,
}

impl From<Option<String>> for StepType {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(StepType::from).unwrap_or_default()
    }
}

impl From<&str> for StepType {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "start" | "begin" | "inicio" | "comienzo" => StepType::Start,
            "decision" | "decisión" | "gateway" | "condition" => StepType::Decision,
            "end" | "finish" | "fin" | "final" => StepType::End,
            _ => StepType::Task,
        }
    }
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Start => "start",
            StepType::Task => "task",
            StepType::Decision => "decision",
            StepType::End => "end",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrgNode {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(rename = "type", default, alias = "tipo")]
    pub node_type: OrgNodeType,
    #[serde(default, deserialize_with = "parent_reference", alias = "padre")]
    pub parent: Option<String>,
}

impl OrgNode {
    pub fn new(name: impl Into<String>, node_type: OrgNodeType, parent: Option<&str>) -> Self {
        Self {
            name: name.into(),
            node_type,
            parent: parent.map(str::to_string),
        }
    }
}

/// Treats `""`, `"null"` and `"none"` as a missing parent.
fn parent_reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|p| {
        let trimmed = p.trim();
        match trimmed.to_lowercase().as_str() {
            "" | "null" | "none" | "ninguno" => None,
            _ => Some(trimmed.to_string()),
        }
    }))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum OrgNodeType {
    Group,
    Company,
    Plant,
    #[default]
    Department,
    Team,
    Warehouse,
    Site,
    Other(String),
}

impl From<Option<String>> for OrgNodeType {
    fn from(value: Option<String>) -> Self {
        let Some(value) = value else {
            return OrgNodeType::default();
        };
        match value.trim().to_lowercase().as_str() {
            "group" | "grupo" | "holding" => OrgNodeType::Group,
            "company" | "empresa" | "compañía" | "compania" => OrgNodeType::Company,
            "plant" | "planta" | "factory" | "fábrica" => OrgNodeType::Plant,
            "department" | "departamento" | "area" | "área" => OrgNodeType::Department,
            "team" | "equipo" => OrgNodeType::Team,
            "warehouse" | "almacén" | "almacen" => OrgNodeType::Warehouse,
            "site" | "sede" | "office" => OrgNodeType::Site,
            _ => OrgNodeType::Other(value.trim().to_string()),
        }
    }
}

impl From<OrgNodeType> for String {
    fn from(value: OrgNodeType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OrgNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrgNodeType::Group => "group",
            OrgNodeType::Company => "company",
            OrgNodeType::Plant => "plant",
            OrgNodeType::Department => "department",
            OrgNodeType::Team => "team",
            OrgNodeType::Warehouse => "warehouse",
            OrgNodeType::Site => "site",
            OrgNodeType::Other(other) => other.as_str(),
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "rol")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "departamento")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", alias = "responsabilidades")]
    pub responsibilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pain_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "influencia")]
    pub influence: Option<String>,
}

pub const SPEAKER_ROLE: &str = "Speaker";

/// Unions detected speakers into the extracted participants, matching names
/// case-insensitively. Returns how many speakers were appended.
pub fn merge_speakers(participants: &mut Vec<Participant>, speakers: &BTreeSet<String>) -> usize {
    let mut added = 0;
    for speaker in speakers {
        let key = speaker.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let known = participants
            .iter()
            .any(|p| p.name.trim().to_lowercase() == key);
        if !known {
            participants.push(Participant {
                name: speaker.trim().to_string(),
                role: SPEAKER_ROLE.to_string(),
                ..Participant::default()
            });
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_accepts_spanish_and_unknown() {
        assert_eq!(StepType::from("Inicio"), StepType::Start);
        assert_eq!(StepType::from("DECISIÓN"), StepType::Decision);
        assert_eq!(StepType::from("fin"), StepType::End);
        assert_eq!(StepType::from("subprocess"), StepType::Task);
    }

    #[test]
    fn step_deserializes_with_missing_and_null_type() {
        let step: ProcessStep = serde_json::from_str(r#"{"name": "A"}"#).unwrap();
        assert_eq!(step.step_type, StepType::Task);
        let step: ProcessStep = serde_json::from_str(r#"{"name": "A", "type": null}"#).unwrap();
        assert_eq!(step.step_type, StepType::Task);
        let step: ProcessStep = serde_json::from_str(r#"{"nombre": "B", "tipo": "End"}"#).unwrap();
        assert_eq!(step.name, "B");
        assert_eq!(step.step_type, StepType::End);
    }

    #[test]
    fn org_node_normalizes_empty_parent() {
        let node: OrgNode =
            serde_json::from_str(r#"{"name": "Plant 1", "type": "planta", "parent": ""}"#).unwrap();
        assert_eq!(node.parent, None);
        assert_eq!(node.node_type, OrgNodeType::Plant);

        let node: OrgNode =
            serde_json::from_str(r#"{"name": "X", "type": "cell", "parent": " Plant 1 "}"#)
                .unwrap();
        assert_eq!(node.parent.as_deref(), Some("Plant 1"));
        assert_eq!(node.node_type, OrgNodeType::Other("cell".into()));
    }

    #[test]
    fn org_node_type_serializes_as_plain_string() {
        let node = OrgNode::new("HQ", OrgNodeType::Company, None);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "company");
    }

    #[test]
    fn merge_speakers_dedupes_case_insensitively() {
        let mut participants = vec![Participant {
            name: "ana".into(),
            role: "Buyer".into(),
            ..Participant::default()
        }];
        let speakers: BTreeSet<String> = ["Ana", "Carlos"].iter().map(|s| s.to_string()).collect();
        let added = merge_speakers(&mut participants, &speakers);
        assert_eq!(added, 1);
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].role, "Buyer");
        assert_eq!(participants[1].name, "Carlos");
        assert_eq!(participants[1].role, SPEAKER_ROLE);
    }
}
