//! Starting the external tool.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Starts the external tool on an interchange file.
pub trait Launcher {
    /// Spawns `executable` with `file` as its only argument and returns the
    /// process id. The process is not waited for.
    fn launch(&self, executable: &Path, file: &Path) -> io::Result<u32>;
}

/// Launches a detached OS process with null stdio.
///
/// The child is reaped by a background thread once it exits, so a
/// long-lived host does not accumulate zombie processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, executable: &Path, file: &Path) -> io::Result<u32> {
        let mut child = Command::new(executable)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        let pid = child.id();

        let reaper = std::thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) => tracing::debug!(pid, %status, "launched tool exited"),
                Err(e) => tracing::debug!(pid, error = %e, "failed to wait for launched tool"),
            });
        if let Err(e) = reaper {
            tracing::warn!(pid, error = %e, "launched tool will not be reaped");
        }
        Ok(pid)
    }
}
