//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::config::BridgeConfig;
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rizom-bridge: UV round trips between a 3D scene and RizomUV.
///
/// Exports the selected meshes of a scene, hands them to a running
/// RizomUV instance or launches one, and imports the edited UVs back.
#[derive(Parser, Debug)]
#[command(name = "rizom-bridge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the bridge metadata database.
    ///
    /// Defaults to `bridge-state.db` in the export directory.
    #[arg(short, long, env = "RIZOM_BRIDGE_DB", global = true)]
    pub db_path: Option<PathBuf>,

    /// Path to a JSON configuration file.
    #[arg(short, long, env = "RIZOM_BRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// RizomUV executable, overriding the configuration.
    #[arg(long, env = "RIZOM_BRIDGE_EXE", global = true)]
    pub exe: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the selected meshes of a scene to RizomUV.
    Export {
        /// Scene document.
        #[arg(short, long)]
        scene: PathBuf,
    },

    /// Import UVs from an interchange file back into a scene.
    Import {
        /// Scene document.
        #[arg(short, long)]
        scene: PathBuf,

        /// Interchange file (default: the last export of the scene).
        file: Option<PathBuf>,
    },

    /// List export records.
    #[command(alias = "ls")]
    Records,

    /// Show bridge state status.
    Status,

    /// Print the export directory.
    Dir,

    /// Check for a running RizomUV instance.
    Probe,

    /// Print the effective configuration.
    Config,

    /// Reset bridge state (delete all records).
    Reset {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

impl Cli {
    /// Builds the effective configuration: the config file (or defaults),
    /// overridden by command-line flags.
    pub fn load_config(&self) -> Result<BridgeConfig> {
        let mut config = BridgeConfig::load(self.config.as_deref())?;
        if let Some(exe) = &self.exe {
            config.executable.clone_from(exe);
        }
        if let Some(db_path) = &self.db_path {
            config.state_db = Some(db_path.clone());
        }
        config.validate()?;
        Ok(config)
    }
}
