use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use tracing::info;

use crate::error::AppError;
use crate::export::{sheets, Sheet};
use crate::pipeline::{AnalysisRecord, DiagramOutcome};

const MERMAID_CDN: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

fn diagram_section(title: &str, outcome: &DiagramOutcome) -> String {
    match outcome {
        DiagramOutcome::Rendered(text) => format!("## {title}\n\n```mermaid\n{text}\n```\n"),
        DiagramOutcome::Withheld(reason) => format!("## {title}\n\n_Not drawn: {reason}_\n"),
        DiagramOutcome::Empty => format!("## {title}\n\n_Nothing extracted._\n"),
    }
}

fn markdown_table(sheet: &Sheet) -> String {
    let escape = |cell: &str| cell.replace('|', "\\|").replace('\n', " ");
    let mut out = format!("| {} |\n", sheet.headers.join(" | "));
    out.push_str(&format!("|{}\n", " --- |".repeat(sheet.headers.len())));
    for row in &sheet.rows {
        let cells: Vec<String> = row.iter().map(|c| escape(c)).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

pub fn markdown_report(record: &AnalysisRecord) -> String {
    let result = &record.recovered.result;
    let mut out = String::from("# Workshop analysis\n\n");
    out.push_str(&format!(
        "Model: `{}` · schema: `{}` · language: `{}`\n\n",
        record.model, record.schema, record.language
    ));

    if let Some(summary) = &result.summary {
        out.push_str(&format!("{summary}\n\n"));
    }
    if !record.speakers.is_empty() {
        let speakers: Vec<&str> = record.speakers.iter().map(String::as_str).collect();
        out.push_str(&format!("Speakers detected: {}\n\n", speakers.join(", ")));
    }
    for warning in &record.warnings {
        out.push_str(&format!("> warning: {warning}\n"));
    }
    for issue in &record.issues {
        out.push_str(&format!("> issue: {issue}\n"));
    }
    if !record.warnings.is_empty() || !record.issues.is_empty() {
        out.push('\n');
    }

    out.push_str(&diagram_section("Process", &record.process_diagram));
    out.push('\n');
    out.push_str(&diagram_section("Organization", &record.org_diagram));

    for sheet in sheets(result) {
        out.push_str(&format!("\n## {}\n\n", sheet.name));
        out.push_str(&markdown_table(&sheet));
    }

    if !record.recovered.status.is_parsed() {
        out.push_str("\n## Raw model output\n\n```text\n");
        out.push_str(&record.recovered.raw);
        out.push_str("\n```\n");
    }
    out
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn data_link(file_name: &str, mime: &str, contents: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(contents.as_bytes());
    format!(
        "<a href=\"data:{mime};base64,{encoded}\" download=\"{file_name}\">{}</a>",
        html_escape(file_name)
    )
}

/// Self-contained page that renders the diagrams in a browser and offers
/// every export as an inline download.
pub fn html_report(record: &AnalysisRecord) -> Result<String, AppError> {
    let analysis_json = serde_json::to_string_pretty(&record.recovered.result)?;
    let mut links = vec![
        data_link("analysis.json", "application/json", &analysis_json),
        data_link("report.md", "text/markdown", &markdown_report(record)),
    ];
    for sheet in sheets(&record.recovered.result) {
        let json = serde_json::to_string_pretty(&sheet)?;
        links.push(data_link(&format!("{}.json", sheet.name), "application/json", &json));
    }

    let mut body = String::new();
    for (title, outcome) in [
        ("Process", &record.process_diagram),
        ("Organization", &record.org_diagram),
    ] {
        body.push_str(&format!("<h2>{title}</h2>\n"));
        match outcome {
            DiagramOutcome::Rendered(text) => {
                body.push_str(&format!("<pre class=\"mermaid\">\n{}\n</pre>\n", html_escape(text)))
            }
            DiagramOutcome::Withheld(reason) => {
                body.push_str(&format!("<p><em>Not drawn: {}</em></p>\n", html_escape(reason)))
            }
            DiagramOutcome::Empty => body.push_str("<p><em>Nothing extracted.</em></p>\n"),
        }
    }
    for warning in &record.warnings {
        body.push_str(&format!("<p class=\"warn\">{}</p>\n", html_escape(warning)));
    }

    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Workshop analysis</title>\n\
         <script src=\"{MERMAID_CDN}\"></script>\n\
         <script>mermaid.initialize({{ startOnLoad: true }});</script>\n\
         <style>body {{ font-family: sans-serif; margin: 2rem; }} .warn {{ color: #b45309; }}</style>\n\
         </head>\n<body>\n<h1>Workshop analysis</h1>\n{body}<h2>Downloads</h2>\n<ul>\n{}\n</ul>\n</body>\n</html>\n",
        links
            .iter()
            .map(|l| format!("<li>{l}</li>"))
            .collect::<Vec<_>>()
            .join("\n")
    ))
}

/// Writes every export for `record` into `dir` and returns the written paths.
pub fn write_workbook(dir: &Path, record: &AnalysisRecord) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut write = |name: &str, contents: &str| -> Result<(), AppError> {
        let path = dir.join(name);
        fs::write(&path, contents)?;
        written.push(path);
        Ok(())
    };

    write(
        "analysis.json",
        &serde_json::to_string_pretty(&record.recovered.result)?,
    )?;
    for sheet in sheets(&record.recovered.result) {
        write(
            &format!("{}.json", sheet.name),
            &serde_json::to_string_pretty(&sheet)?,
        )?;
    }
    if let Some(text) = record.process_diagram.text() {
        write("process.mmd", text)?;
    }
    if let Some(text) = record.org_diagram.text() {
        write("org.mmd", text)?;
    }
    write("report.md", &markdown_report(record))?;
    write("report.html", &html_report(record)?)?;

    info!(dir = %dir.display(), files = written.len(), "exports written");
    Ok(written)
}
