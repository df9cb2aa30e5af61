use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{Cli, Config, OutputFormat};
use crate::error::{AppError, LlmError};
use crate::export::{render_table, sheets, write_workbook};
use crate::llm::{CompletionBackend, ExtractionClient, Language, OpenAiBackend, SchemaKind};
use crate::pipeline::{AnalysisOutcome, AnalysisRecord, DiagramOutcome, Pipeline};
use crate::state::Session;

pub fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_cli(&cli)?;
    let api_key = config.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
    let backend = OpenAiBackend::new(api_key, &config.base_url, config.timeout)?;
    let pipeline = Pipeline::new(ExtractionClient::new(backend, config.extraction_settings()));
    let mut session = Session::new(config.language, config.schema);

    info!(
        model = %config.model,
        fallback = config.fallback_model.as_deref().unwrap_or("none"),
        schema = %config.schema,
        "workshop mapper ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.interactive {
        let stdin = io::stdin();
        return interactive(
            &pipeline,
            &mut session,
            stdin.lock(),
            &mut out,
            cli.format,
            cli.export.as_deref(),
        );
    }

    let text = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    submit(&pipeline, &mut session, &text, &mut out, cli.format)?;

    if let Some(dir) = &cli.export {
        match session.last() {
            Some(record) => {
                write_workbook(dir, record)?;
            }
            None => warn!("nothing to export"),
        }
    }
    Ok(())
}

/// A line typed at the interactive prompt that is not transcript text.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Language(Language),
    Schema(SchemaKind),
    Show,
    Export(Option<PathBuf>),
    Quit,
}

impl SessionCommand {
    /// `None` when the line is transcript text.
    pub fn parse(line: &str) -> Option<Result<Self, AppError>> {
        let rest = line.trim().strip_prefix(':')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        let command = match (name, arg) {
            ("lang", Some(value)) => value
                .parse()
                .map(SessionCommand::Language)
                .map_err(AppError::from),
            ("schema", Some(value)) => value
                .parse()
                .map(SessionCommand::Schema)
                .map_err(AppError::from),
            ("show", None) => Ok(SessionCommand::Show),
            ("export", dir) => Ok(SessionCommand::Export(dir.map(PathBuf::from))),
            ("quit" | "q", None) => Ok(SessionCommand::Quit),
            _ => Err(AppError::Usage(format!(
                "unknown command ':{rest}' \
                 (try :lang es|en, :schema flat|nested|pro, :show, :export DIR, :quit)"
            ))),
        };
        Some(command)
    }
}

/// Runs the pipeline on `text`, stores the outcome in the session and prints it.
pub fn submit<B: CompletionBackend, W: Write>(
    pipeline: &Pipeline<B>,
    session: &mut Session,
    text: &str,
    out: &mut W,
    format: OutputFormat,
) -> Result<(), AppError> {
    let outcome = pipeline.analyze(session.schema, session.language, text);
    session.apply(&outcome);
    print_outcome(out, &outcome, format)
}

/// Reads transcripts until `:quit` or EOF. A blank line ends a transcript.
pub fn interactive<B, R, W>(
    pipeline: &Pipeline<B>,
    session: &mut Session,
    input: R,
    out: &mut W,
    format: OutputFormat,
    export_dir: Option<&Path>,
) -> Result<(), AppError>
where
    B: CompletionBackend,
    R: BufRead,
    W: Write,
{
    writeln!(
        out,
        "Paste a transcript and finish with an empty line. \
         Commands: :lang, :schema, :show, :export, :quit"
    )?;
    let mut buffer = String::new();

    for line in input.lines() {
        let line = line?;

        if buffer.is_empty() {
            if let Some(command) = SessionCommand::parse(&line) {
                let command = match command {
                    Ok(command) => command,
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        continue;
                    }
                };
                debug!(?command, "session command");
                match command {
                    SessionCommand::Language(language) => {
                        session.language = language;
                        writeln!(out, "language set to {language}")?;
                    }
                    SessionCommand::Schema(schema) => {
                        session.schema = schema;
                        writeln!(out, "schema set to {schema}")?;
                    }
                    SessionCommand::Show => match session.last() {
                        Some(record) => print_record(out, record, format)?,
                        None => writeln!(out, "no analysis yet")?,
                    },
                    SessionCommand::Export(dir) => {
                        let Some(dir) = dir.as_deref().or(export_dir) else {
                            writeln!(out, "usage: :export DIR")?;
                            continue;
                        };
                        match session.last() {
                            Some(record) => {
                                let files = write_workbook(dir, record)?;
                                writeln!(out, "wrote {} files to {}", files.len(), dir.display())?;
                            }
                            None => writeln!(out, "nothing to export")?,
                        }
                    }
                    SessionCommand::Quit => return Ok(()),
                }
                continue;
            }
        }

        if line.trim().is_empty() {
            if !buffer.is_empty() {
                submit(pipeline, session, &buffer, out, format)?;
                buffer.clear();
            }
            continue;
        }
        buffer.push_str(&line);
        buffer.push('\n');
    }

    if !buffer.trim().is_empty() {
        submit(pipeline, session, &buffer, out, format)?;
    }
    Ok(())
}

pub fn print_outcome<W: Write>(
    out: &mut W,
    outcome: &AnalysisOutcome,
    format: OutputFormat,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, outcome)?;
            writeln!(out)?;
        }
        OutputFormat::Text => match outcome {
            AnalysisOutcome::Completed(record) => print_record(out, record, format)?,
            AnalysisOutcome::EmptyInput => writeln!(out, "empty transcript, nothing to analyse")?,
            AnalysisOutcome::Unavailable { reason } => writeln!(out, "{reason}")?,
        },
    }
    Ok(())
}

fn print_record<W: Write>(
    out: &mut W,
    record: &AnalysisRecord,
    format: OutputFormat,
) -> Result<(), AppError> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, record)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "model: {} ({} / {})", record.model, record.schema, record.language)?;
    if let Some(summary) = &record.recovered.result.summary {
        writeln!(out, "\n{summary}")?;
    }
    for warning in &record.warnings {
        writeln!(out, "warning: {warning}")?;
    }
    for issue in &record.issues {
        writeln!(out, "issue: {issue}")?;
    }

    for (title, diagram) in [
        ("process", &record.process_diagram),
        ("organization", &record.org_diagram),
    ] {
        writeln!(out, "\n== {title} ==")?;
        match diagram {
            DiagramOutcome::Rendered(text) => writeln!(out, "{text}")?,
            DiagramOutcome::Withheld(reason) => writeln!(out, "not drawn: {reason}")?,
            DiagramOutcome::Empty => writeln!(out, "nothing extracted")?,
        }
    }

    for sheet in sheets(&record.recovered.result) {
        writeln!(out, "\n== {} ==", sheet.name)?;
        writeln!(out, "{}", render_table(&sheet))?;
    }

    if !record.recovered.status.is_parsed() {
        writeln!(out, "\n== raw model output ==\n{}", record.recovered.raw)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert!(SessionCommand::parse("Ana: hola").is_none());
        assert!(matches!(
            SessionCommand::parse(":lang en"),
            Some(Ok(SessionCommand::Language(Language::En)))
        ));
        assert!(matches!(
            SessionCommand::parse("  :schema pro "),
            Some(Ok(SessionCommand::Schema(SchemaKind::Pro)))
        ));
        assert!(matches!(
            SessionCommand::parse(":export"),
            Some(Ok(SessionCommand::Export(None)))
        ));
        assert!(matches!(SessionCommand::parse(":quit"), Some(Ok(SessionCommand::Quit))));
    }

    #[test]
    fn bad_commands_are_usage_errors() {
        assert!(matches!(SessionCommand::parse(":schema deep"), Some(Err(AppError::Config(_)))));
        assert!(matches!(SessionCommand::parse(":dance"), Some(Err(AppError::Usage(_)))));
        assert!(matches!(SessionCommand::parse(":lang"), Some(Err(AppError::Usage(_)))));
    }
}
