//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::bridge::Bridge;
use crate::cli::output::{
    OutputFormat, format_config, format_dir, format_export_batch, format_import_report,
    format_probe, format_records, format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::config::BridgeConfig;
use crate::error::{CommandError, Error, Result};
use crate::host::{Host, SceneFile};
use crate::negotiator::Negotiator;
use crate::storage::{RecordStore, SqliteRecordStore};
use std::path::{Path, PathBuf};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the command fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = cli.load_config()?;

    match &cli.command {
        Commands::Export { scene } => cmd_export(&config, scene, format),
        Commands::Import { scene, file } => cmd_import(&config, scene, file.as_deref(), format),
        Commands::Records => cmd_records(&config, format),
        Commands::Status => cmd_status(&config, format),
        Commands::Dir => cmd_dir(&config, format),
        Commands::Probe => cmd_probe(&config, format),
        Commands::Config => Ok(format_config(&config, format)),
        Commands::Reset { yes } => cmd_reset(&config, *yes),
    }
}

/// Opens the metadata store and ensures its schema is current.
fn open_store(config: &BridgeConfig) -> Result<(SqliteRecordStore, PathBuf)> {
    let db_path = config.state_db_path()?;
    let mut store = SqliteRecordStore::open(&db_path)?;
    store.init()?;
    Ok((store, db_path))
}

// ==================== Command Implementations ====================

fn cmd_export(config: &BridgeConfig, scene: &Path, format: OutputFormat) -> Result<String> {
    let mut host = SceneFile::open(scene)?;
    let (store, _) = open_store(config)?;
    let mut bridge = Bridge::new(config.clone(), store);

    let batch = bridge.export_selection(&mut host)?;
    host.save()?;

    if let Some(error) = batch.handoff_error() {
        return Err(CommandError::HandoffFailed {
            file: batch.file.display().to_string(),
            reason: error.to_string(),
        }
        .into());
    }

    Ok(format_export_batch(&batch, format))
}

fn cmd_import(
    config: &BridgeConfig,
    scene: &Path,
    file: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let mut host = SceneFile::open(scene)?;
    let (store, _) = open_store(config)?;

    let file = match file {
        Some(file) => file.to_path_buf(),
        None => latest_export(&store, &host)?,
    };

    let mut bridge = Bridge::new(config.clone(), store);
    let report = bridge.import_from(&mut host, &file)?;
    host.save()?;

    let report = report.into_result()?;
    Ok(format_import_report(&report, format))
}

/// Most recent interchange file exported from the scene's project.
fn latest_export(store: &SqliteRecordStore, host: &SceneFile) -> Result<PathBuf> {
    let project = host
        .project_path()
        .ok_or_else(|| CommandError::MissingArgument("FILE".to_string()))?;
    store
        .latest_file_for_project(project)?
        .ok_or_else(|| Error::Resolution {
            subject: format!("{} (no previous export; pass FILE)", project.display()),
        })
}

fn cmd_records(config: &BridgeConfig, format: OutputFormat) -> Result<String> {
    let (store, _) = open_store(config)?;
    let records = store.list_records()?;
    Ok(format_records(&records, format))
}

fn cmd_status(config: &BridgeConfig, format: OutputFormat) -> Result<String> {
    let (store, db_path) = open_store(config)?;
    let stats = store.stats()?;
    let export_dir = config.export_dir()?;
    Ok(format_status(&stats, &export_dir, &db_path, format))
}

fn cmd_dir(config: &BridgeConfig, format: OutputFormat) -> Result<String> {
    let dir = config.export_dir()?;
    Ok(format_dir(&dir, format))
}

fn cmd_probe(config: &BridgeConfig, format: OutputFormat) -> Result<String> {
    let (store, _) = open_store(config)?;
    let preferred = store.last_session_port()?;
    let outcome = Negotiator::new(config).probe(preferred);
    Ok(format_probe(&outcome, format))
}

fn cmd_reset(config: &BridgeConfig, yes: bool) -> Result<String> {
    if !yes {
        return Err(CommandError::ExecutionFailed(
            "Use --yes to confirm reset. This will delete all export records.".to_string(),
        )
        .into());
    }

    let (mut store, _) = open_store(config)?;
    store.reset()?;

    Ok("Bridge state reset successfully.\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fixtures::{quad, scene};
    use crate::error::ErrorKind;
    use crate::host::SceneDocument;
    use crate::negotiator::testing::closed_port;
    use tempfile::TempDir;

    fn cli(dir: &Path, command: Commands) -> Cli {
        let config_path = dir.join("config.json");
        let config = BridgeConfig {
            executable: dir.join("missing-rizomuv"),
            command_ports: vec![closed_port()],
            connect_timeout: std::time::Duration::from_millis(200),
            ack_timeout: std::time::Duration::from_millis(200),
            export_root: Some(dir.join("tmp")),
            state_db: Some(dir.join("state.db")),
        };
        std::fs::write(&config_path, config.to_json().unwrap()).unwrap();
        Cli {
            db_path: None,
            config: Some(config_path),
            exe: None,
            verbose: false,
            format: "json".to_string(),
            command,
        }
    }

    #[test]
    fn test_export_without_executable_keeps_file() {
        let temp = TempDir::new().unwrap();
        let scene = scene(temp.path());
        let scene_path = scene.host.project_path().unwrap().to_path_buf();

        let err = execute(&cli(
            temp.path(),
            Commands::Export {
                scene: scene_path.clone(),
            },
        ))
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Helmet.ruvx.json"));
        assert!(
            temp.path()
                .join("tmp/rizomuv_bridge/Helmet.ruvx.json")
                .is_file()
        );

        let records = execute(&cli(temp.path(), Commands::Records)).unwrap();
        let records: serde_json::Value = serde_json::from_str(&records).unwrap();
        assert_eq!(records.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_import_defaults_to_last_export() {
        let temp = TempDir::new().unwrap();
        let scene = scene(temp.path());
        let scene_path = scene.host.project_path().unwrap().to_path_buf();

        let _ = execute(&cli(
            temp.path(),
            Commands::Export {
                scene: scene_path.clone(),
            },
        ));
        let output = execute(&cli(
            temp.path(),
            Commands::Import {
                scene: scene_path,
                file: None,
            },
        ))
        .unwrap();

        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["updated"].as_array().unwrap().len(), 2);
        assert!(
            report["file"]
                .as_str()
                .unwrap()
                .ends_with("Helmet.ruvx.json")
        );
    }

    #[test]
    fn test_import_without_previous_export() {
        let temp = TempDir::new().unwrap();
        let mut doc = SceneDocument::default();
        doc.add_mesh("Body", quad());
        let mut host = SceneFile::unsaved(doc);
        let scene_path = temp.path().join("fresh.scene.json");
        host.save_as(&scene_path).unwrap();

        let err = execute(&cli(
            temp.path(),
            Commands::Import {
                scene: scene_path,
                file: None,
            },
        ))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let temp = TempDir::new().unwrap();
        let err = execute(&cli(temp.path(), Commands::Reset { yes: false })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Command);

        let output = execute(&cli(temp.path(), Commands::Reset { yes: true })).unwrap();
        assert!(output.contains("reset successfully"));
    }

    #[test]
    fn test_dir_and_status() {
        let temp = TempDir::new().unwrap();
        let output = execute(&cli(temp.path(), Commands::Dir)).unwrap();
        assert!(output.contains("rizomuv_bridge"));

        let output = execute(&cli(temp.path(), Commands::Status)).unwrap();
        let status: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(status["record_count"], 0);
        assert_eq!(status["schema_version"], 1);
    }
}
