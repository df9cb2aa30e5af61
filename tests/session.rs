//! Interactive session and export behaviour.
mod common;

use std::io::Cursor;

use common::*;
use pretty_assertions::assert_eq;
use workshop_mapper::config::OutputFormat;
use workshop_mapper::export::{sheets, write_workbook};
use workshop_mapper::llm::{Language, SchemaKind};
use workshop_mapper::orchestrator::{interactive, submit};
use workshop_mapper::state::Session;

fn run_session(
    backend: &Scripted,
    input: &str,
    export: Option<&std::path::Path>,
) -> (Session, String) {
    let pipeline = pipeline(backend);
    let mut session = Session::default();
    let mut out = Vec::new();
    interactive(
        &pipeline,
        &mut session,
        Cursor::new(input.to_string()),
        &mut out,
        OutputFormat::Text,
        export,
    )
    .expect("session runs");
    (session, String::from_utf8(out).expect("utf-8 output"))
}

#[test]
fn commands_change_preferences_used_by_the_next_analysis() {
    let backend = Scripted::always(NESTED_REPLY);
    let input = ":lang en\n:schema flat\nAna: hola\n\n:quit\nAna: ignored\n\n";
    let (session, out) = run_session(&backend, input, None);

    assert_eq!(session.language, Language::En);
    assert_eq!(session.schema, SchemaKind::Flat);
    assert_eq!(session.analyses(), 1);
    assert!(out.contains("language set to en"));
    assert!(out.contains("schema set to flat"));
    assert!(out.contains("flowchart TD"));

    let seen = backend.seen.borrow();
    assert_eq!(seen.len(), 1);
    let instruction = &seen[0].messages[0].content;
    assert!(instruction.contains("free-text value in English"));
    assert!(instruction.contains("\"actors\""));
    assert!(!instruction.contains("\"organization\""));
}

#[test]
fn each_submission_replaces_the_record() {
    let backend = Scripted::new(vec![
        Ok(NESTED_REPLY.to_string()),
        Ok(r#"{"steps": [{"name": "Only step"}]}"#.to_string()),
    ]);
    let (session, _) = run_session(&backend, "Ana: first\n\nCarlos: second", None);

    assert_eq!(session.analyses(), 2);
    let record = session.last().expect("latest record");
    assert_eq!(record.recovered.result.steps.len(), 1);
    assert_eq!(record.recovered.result.steps[0].name, "Only step");
}

#[test]
fn unknown_command_does_not_end_the_session() {
    let backend = Scripted::always("{}");
    let (session, out) = run_session(&backend, ":dance\n:show\n", None);

    assert!(out.contains("unknown command"));
    assert!(out.contains("no analysis yet"));
    assert!(session.last().is_none());
}

#[test]
fn export_writes_every_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let backend = Scripted::always(NESTED_REPLY);
    let input = format!("{TRANSCRIPT}\n\n:export {}\n", dir.path().display());
    let (session, out) = run_session(&backend, &input, None);
    assert!(out.contains("wrote"));

    let record = session.last().expect("record");
    let expected_sheets = sheets(&record.recovered.result).len();
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .expect("read export dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    for name in ["analysis.json", "org.mmd", "process.mmd", "report.html", "report.md"] {
        assert!(names.contains(&name.to_string()), "missing {name}");
    }
    assert_eq!(names.len(), 5 + expected_sheets);

    let process = std::fs::read_to_string(dir.path().join("process.mmd")).expect("process.mmd");
    assert_eq!(process, record.process_diagram.text().expect("diagram"));

    let html = std::fs::read_to_string(dir.path().join("report.html")).expect("report.html");
    assert!(html.contains("<pre class=\"mermaid\">"));
    assert!(html.contains("download=\"analysis.json\""));
}

#[test]
fn export_skips_diagrams_that_were_not_drawn() {
    let dir = tempfile::tempdir().expect("temp dir");
    let backend = Scripted::always(r#"{"pains": ["slow approvals"]}"#);
    let pipeline = pipeline(&backend);
    let mut session = Session::new(Language::En, SchemaKind::Flat);
    let mut out = Vec::new();
    submit(&pipeline, &mut session, "Ana: hola", &mut out, OutputFormat::Json).expect("submit");

    let json: serde_json::Value = serde_json::from_slice(&out).expect("json output");
    assert_eq!(json["outcome"], "completed");

    let written = write_workbook(dir.path(), session.last().expect("record")).expect("export");
    assert!(written.iter().all(|p| p.extension().map_or(true, |ext| ext != "mmd")));
    assert!(dir.path().join("pains.json").exists());
    assert!(dir.path().join("participants.json").exists());
}

#[test]
fn failed_analysis_clears_what_would_be_exported() {
    let backend = Scripted::new(vec![
        Ok(NESTED_REPLY.to_string()),
        Err(unavailable()),
        Err(unavailable()),
    ]);
    let (session, out) = run_session(&backend, "Ana: one\n\nAna: two\n\n:export\n", None);

    assert!(session.last().is_none());
    assert!(out.contains("analysis unavailable"));
    assert!(out.contains("usage: :export DIR"));
}
