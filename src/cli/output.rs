//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::bridge::{ExportBatch, ImportReport};
use crate::config::BridgeConfig;
use crate::core::ExportRecord;
use crate::error::Error;
use crate::negotiator::{HandoffOutcome, ProbeOutcome};
use crate::storage::StoreStats;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a status response.
#[must_use]
pub fn format_status(
    stats: &StoreStats,
    export_dir: &Path,
    db_path: &Path,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => format_status_text(stats, export_dir, db_path),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct StatusOutput<'a> {
                #[serde(flatten)]
                stats: &'a StoreStats,
                export_dir: &'a Path,
                db_path: &'a Path,
            }
            format_json(&StatusOutput {
                stats,
                export_dir,
                db_path,
            })
        }
    }
}

fn format_status_text(stats: &StoreStats, export_dir: &Path, db_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("rizom-bridge Status\n");
    output.push_str("===================\n\n");
    let _ = writeln!(output, "  Records:       {}", stats.record_count);
    let _ = writeln!(output, "  Projects:      {}", stats.project_count);
    let _ = writeln!(output, "  Files:         {}", stats.file_count);
    let _ = writeln!(
        output,
        "  Last port:     {}",
        stats
            .last_session_port
            .map_or_else(|| "-".to_string(), |p| p.to_string())
    );
    let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
    if let Some(size) = stats.db_size {
        let _ = writeln!(output, "  DB size:       {size} bytes");
    }
    let _ = writeln!(output, "  Database:      {}", db_path.display());
    let _ = writeln!(output, "  Export dir:    {}", export_dir.display());
    output
}

/// Formats the result of an export.
#[must_use]
pub fn format_export_batch(batch: &ExportBatch, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "Exported {} object(s) to {}",
                batch.records.len(),
                batch.file.display()
            );
            for object in batch.objects() {
                let _ = writeln!(output, "  {object}");
            }
            if !batch.skipped.is_empty() {
                let names: Vec<String> = batch.skipped.iter().map(ToString::to_string).collect();
                let _ = writeln!(output, "Skipped (not meshes): {}", names.join(", "));
            }
            let _ = writeln!(output, "{}", describe_handoff(&batch.handoff));
            output
        }
        OutputFormat::Json => format_json(batch),
    }
}

fn describe_handoff(handoff: &HandoffOutcome) -> String {
    match handoff {
        HandoffOutcome::HandedOff { port } => {
            format!("Sent to running RizomUV on port {port}")
        }
        HandoffOutcome::Launched { pid, executable } => {
            format!("Launched {} (pid {pid})", executable.display())
        }
        HandoffOutcome::Failed { error } => format!("Not handed off: {error}"),
    }
}

/// Formats the result of an import.
#[must_use]
pub fn format_import_report(report: &ImportReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_import_text(report),
        OutputFormat::Json => format_json(report),
    }
}

fn format_import_text(report: &ImportReport) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "Imported UVs from {}: {} object(s) updated",
        report.file.display(),
        report.updated.len()
    );
    for update in &report.updated {
        let _ = write!(
            output,
            "  {}: {} channel(s) written",
            update.object, update.channels_updated
        );
        if update.channels_removed > 0 {
            let _ = write!(output, ", {} removed", update.channels_removed);
        }
        output.push('\n');
    }
    for warning in &report.warnings {
        let _ = writeln!(output, "Warning: {warning}");
    }
    for failure in &report.failures {
        let _ = writeln!(output, "Failed: {}: {}", failure.object, failure.reason);
    }
    output
}

/// Formats a record list.
#[must_use]
pub fn format_records(records: &[ExportRecord], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_records_text(records),
        OutputFormat::Json => format_json(&records),
    }
}

fn format_records_text(records: &[ExportRecord]) -> String {
    if records.is_empty() {
        return "No export records found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str("Export records:\n");
    let _ = writeln!(
        output,
        "{:<8} {:<20} {:<24} Project",
        "Token", "Object", "File"
    );
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for record in records {
        let file = record
            .source_file
            .file_name()
            .map_or_else(|| "-".to_string(), |f| f.to_string_lossy().to_string());
        let _ = writeln!(
            output,
            "{:<8} {:<20} {:<24} {}",
            record.object.token,
            truncate(&record.object.name, 20),
            truncate(&file, 24),
            record.project.display()
        );
    }

    output
}

/// Formats a probe result.
#[must_use]
pub fn format_probe(outcome: &ProbeOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let attempts = match outcome {
                ProbeOutcome::Reachable { port, attempts } => {
                    let _ = writeln!(output, "RizomUV is listening on port {port}");
                    attempts
                }
                ProbeOutcome::Unreachable { attempts } => {
                    output.push_str("No running RizomUV instance found\n");
                    attempts
                }
            };
            for attempt in attempts {
                let _ = writeln!(output, "  port {}: {}", attempt.port, attempt.reason);
            }
            output
        }
        OutputFormat::Json => format_json(outcome),
    }
}

/// Formats the effective configuration.
#[must_use]
pub fn format_config(config: &BridgeConfig, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let ports: Vec<String> = config.command_ports.iter().map(ToString::to_string).collect();
            let mut output = String::new();
            let _ = writeln!(output, "  Executable:      {}", config.executable.display());
            let _ = writeln!(output, "  Command ports:   {}", ports.join(", "));
            let _ = writeln!(output, "  Connect timeout: {:?}", config.connect_timeout);
            let _ = writeln!(output, "  Ack timeout:     {:?}", config.ack_timeout);
            let _ = writeln!(
                output,
                "  Export root:     {}",
                config
                    .export_root
                    .as_ref()
                    .map_or_else(|| "(system temp)".to_string(), |p| p.display().to_string())
            );
            let _ = writeln!(
                output,
                "  State database:  {}",
                config
                    .state_db
                    .as_ref()
                    .map_or_else(|| "(export dir)".to_string(), |p| p.display().to_string())
            );
            output
        }
        OutputFormat::Json => format_json(config),
    }
}

/// Formats the export directory.
#[must_use]
pub fn format_dir(dir: &Path, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{}\n", dir.display()),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct DirOutput<'a> {
                export_dir: &'a Path,
            }
            format_json(&DirOutput { export_dir: dir })
        }
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
                kind: crate::error::ErrorKind,
            }
            format_json(&ErrorOutput {
                error: error.to_string(),
                kind: error.kind(),
            })
        }
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ObjectId, SelectionSnapshot};
    use crate::error::{NegotiationError, PreconditionError};
    use crate::negotiator::ProbeAttempt;
    use std::path::PathBuf;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Körper_Lowpoly", 8), "Körpe...");
    }

    #[test]
    fn test_format_status() {
        let stats = StoreStats {
            record_count: 2,
            project_count: 1,
            file_count: 1,
            last_session_port: Some(41414),
            schema_version: 1,
            db_size: Some(4096),
        };
        let dir = Path::new("/tmp/rizomuv_bridge");
        let db = Path::new("/tmp/rizomuv_bridge/bridge-state.db");

        let text = format_status(&stats, dir, db, OutputFormat::Text);
        assert!(text.contains("Records:       2"));
        assert!(text.contains("Last port:     41414"));

        let json = format_status(&stats, dir, db, OutputFormat::Json);
        assert!(json.contains("\"record_count\": 2"));
        assert!(json.contains("\"export_dir\": \"/tmp/rizomuv_bridge\""));
    }

    #[test]
    fn test_format_export_batch_failed_handoff() {
        let body = ObjectId::new(1, "Body");
        let file = PathBuf::from("/tmp/rizomuv_bridge/Body.ruvx.json");
        let batch = ExportBatch {
            file: file.clone(),
            records: vec![ExportRecord::new(
                PathBuf::from("/projects/robot.scene.json"),
                body,
                file,
                &SelectionSnapshot::default(),
            )],
            skipped: vec![ObjectId::new(3, "Lamp")],
            handoff: HandoffOutcome::Failed {
                error: NegotiationError::ExecutableMissing {
                    path: "/opt/rizomuv/rizomuv".to_string(),
                },
            },
        };

        let text = format_export_batch(&batch, OutputFormat::Text);
        assert!(text.starts_with("Exported 1 object(s) to /tmp/rizomuv_bridge/Body.ruvx.json"));
        assert!(text.contains("Skipped (not meshes): Lamp#3"));
        assert!(text.contains("Not handed off: RizomUV executable not found"));

        let json = format_export_batch(&batch, OutputFormat::Json);
        assert!(json.contains("\"outcome\": \"failed\""));
    }

    #[test]
    fn test_format_records_empty() {
        assert_eq!(
            format_records(&[], OutputFormat::Text),
            "No export records found.\n"
        );
        assert_eq!(format_records(&[], OutputFormat::Json), "[]");
    }

    #[test]
    fn test_format_probe_unreachable() {
        let outcome = ProbeOutcome::Unreachable {
            attempts: vec![ProbeAttempt {
                port: 41414,
                reason: "connect failed: connection refused".to_string(),
            }],
        };
        let text = format_probe(&outcome, OutputFormat::Text);
        assert!(text.contains("No running RizomUV instance found"));
        assert!(text.contains("port 41414: connect failed"));

        let json = format_probe(&outcome, OutputFormat::Json);
        assert!(json.contains("\"state\": \"unreachable\""));
    }

    #[test]
    fn test_format_error_json() {
        let err: Error = PreconditionError::ProjectNotSaved.into();
        let json = format_error(&err, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "precondition");
        assert!(value["error"].as_str().unwrap().starts_with("project not saved"));
    }
}
