//! Bridge configuration.
//!
//! [`BridgeConfig`] is an explicit value handed to the negotiator and the
//! orchestrators at call time. It is loaded from a JSON file (all fields
//! optional) and then overridden by command-line flags.

use crate::error::{Error, IoError, Result};
use crate::io::export_directory;
use crate::storage::DEFAULT_DB_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default loopback command port of the external tool.
pub const DEFAULT_COMMAND_PORT: u16 = 41414;

/// Config directory name under the user config dir.
pub const CONFIG_DIR_NAME: &str = "rizom-bridge";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Runtime configuration for a round trip.
///
/// # Examples
///
/// ```
/// use rizom_bridge::config::BridgeConfig;
///
/// let config: BridgeConfig =
///     serde_json::from_str(r#"{"executable": "/usr/local/bin/rizomuv", "connect_timeout": "250ms"}"#)
///         .unwrap();
/// assert_eq!(config.connect_timeout.as_millis(), 250);
/// assert_eq!(config.command_ports, vec![41414]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Path of the external tool executable.
    pub executable: PathBuf,

    /// Loopback command ports probed for a running instance, in order.
    pub command_ports: Vec<u16>,

    /// Bound on each connection attempt.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Bound on waiting for a load acknowledgement.
    #[serde(with = "humantime_serde")]
    pub ack_timeout: Duration,

    /// Temporary root overriding the OS temp directory.
    pub export_root: Option<PathBuf>,

    /// Metadata store location. Defaults to the export directory.
    pub state_db: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            command_ports: vec![DEFAULT_COMMAND_PORT],
            connect_timeout: Duration::from_millis(500),
            ack_timeout: Duration::from_secs(2),
            export_root: None,
            state_db: None,
        }
    }
}

impl BridgeConfig {
    /// Loads configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = crate::io::read_file(path)?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("invalid config file {}: {e}", path.display()),
        })
    }

    /// Loads `explicit` if given, else the user config file if it exists,
    /// else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match user_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Resolves (and creates) the export directory.
    pub fn export_dir(&self) -> Result<PathBuf> {
        export_directory(self.export_root.as_deref())
    }

    /// Resolves the metadata store path.
    ///
    /// The default location lives in the export directory, which is created
    /// on demand.
    pub fn state_db_path(&self) -> Result<PathBuf> {
        match &self.state_db {
            Some(path) => Ok(path.clone()),
            None => Ok(self.export_dir()?.join(DEFAULT_DB_NAME)),
        }
    }

    /// Checks values that would make every handoff fail.
    pub fn validate(&self) -> Result<()> {
        if self.executable.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "executable path is empty".to_string(),
            });
        }
        if self.connect_timeout.is_zero() || self.ack_timeout.is_zero() {
            return Err(Error::Config {
                message: "timeouts must be greater than zero".to_string(),
            });
        }
        if self.command_ports.contains(&0) {
            return Err(Error::Config {
                message: "command port 0 is not a valid port".to_string(),
            });
        }
        Ok(())
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| IoError::Generic(e.to_string()).into())
    }
}

/// Location of the per-user config file.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Platform-specific default executable path.
#[must_use]
pub fn default_executable() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files\Rizom Lab\RizomUV 2024.1\rizomuv.exe")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Applications/RizomUV.2024.1.app/Contents/MacOS/rizomuv")
    } else {
        PathBuf::from("/opt/rizomuv/rizomuv")
    }
}
