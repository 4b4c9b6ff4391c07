//! Reach-or-launch negotiation with the external tool.
//!
//! A handoff walks a fixed sequence of states:
//!
//! ```text
//! Unknown -> probe -> Reachable   -> HandedOff
//!                  -> Unreachable -> Launched | Failed
//! ```
//!
//! Candidate ports are probed in order: the most recently used port first,
//! then the configured ports, duplicates removed. The first instance that
//! acknowledges the command wins. When none does, the configured
//! executable is launched with the file as its argument.

mod launcher;
pub mod protocol;

pub use launcher::{Launcher, ProcessLauncher};
pub use protocol::{ToolCommand, ToolReply, ToolSession};

use crate::config::BridgeConfig;
use crate::error::NegotiationError;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One unsuccessful probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeAttempt {
    /// Probed port.
    pub port: u16,
    /// Why the candidate was marked unreachable.
    pub reason: String,
}

/// Result of the probe phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// An instance acknowledged on `port`.
    Reachable {
        /// Acknowledging port.
        port: u16,
        /// Candidates that failed before it.
        attempts: Vec<ProbeAttempt>,
    },
    /// No candidate acknowledged.
    Unreachable {
        /// Every failed candidate, in probe order.
        attempts: Vec<ProbeAttempt>,
    },
}

/// Terminal state of a handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandoffOutcome {
    /// A running instance accepted the file.
    HandedOff {
        /// Port of the instance.
        port: u16,
    },
    /// A new instance was started on the file.
    Launched {
        /// Process id of the new instance.
        pid: u32,
        /// Executable that was started.
        executable: PathBuf,
    },
    /// Neither reachable nor launchable.
    Failed {
        /// What went wrong.
        #[serde(serialize_with = "serialize_display")]
        error: NegotiationError,
    },
}

impl HandoffOutcome {
    /// True unless the handoff failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

fn serialize_display<S: Serializer>(err: &NegotiationError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

/// Decides whether to reach a running instance or launch a new one.
#[derive(Debug, Clone)]
pub struct Negotiator<L: Launcher = ProcessLauncher> {
    executable: PathBuf,
    ports: Vec<u16>,
    connect_timeout: Duration,
    ack_timeout: Duration,
    launcher: L,
}

impl Negotiator<ProcessLauncher> {
    /// Creates a negotiator that launches real processes.
    #[must_use]
    pub fn new(config: &BridgeConfig) -> Self {
        Self::with_launcher(config, ProcessLauncher)
    }
}

impl<L: Launcher> Negotiator<L> {
    /// Creates a negotiator with a custom launcher.
    #[must_use]
    pub fn with_launcher(config: &BridgeConfig, launcher: L) -> Self {
        Self {
            executable: config.executable.clone(),
            ports: config.command_ports.clone(),
            connect_timeout: config.connect_timeout,
            ack_timeout: config.ack_timeout,
            launcher,
        }
    }

    /// Returns the launcher.
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Ports in probe order.
    #[must_use]
    pub fn candidates(&self, preferred: Option<u16>) -> Vec<u16> {
        let mut ports = Vec::with_capacity(self.ports.len() + 1);
        for port in preferred.into_iter().chain(self.ports.iter().copied()) {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
        ports
    }

    /// Checks which candidate answers a ping, without handing anything over.
    #[must_use]
    pub fn probe(&self, preferred: Option<u16>) -> ProbeOutcome {
        self.probe_with(preferred, &ToolCommand::Ping)
    }

    /// Hands `file` to the external tool.
    ///
    /// Never returns an error: a failure is the [`HandoffOutcome::Failed`]
    /// state. Nothing is retried.
    pub fn handoff(&self, file: &Path, preferred: Option<u16>) -> HandoffOutcome {
        let command = ToolCommand::Load {
            path: file.to_path_buf(),
        };
        match self.probe_with(preferred, &command) {
            ProbeOutcome::Reachable { port, .. } => {
                info!(port, file = %file.display(), "handed off to running instance");
                HandoffOutcome::HandedOff { port }
            }
            ProbeOutcome::Unreachable { attempts } => {
                debug!(candidates = attempts.len(), "no running instance, launching");
                self.launch(file)
            }
        }
    }

    fn probe_with(&self, preferred: Option<u16>, command: &ToolCommand) -> ProbeOutcome {
        let mut attempts = Vec::new();
        for port in self.candidates(preferred) {
            match self.try_port(port, command) {
                Ok(()) => {
                    debug!(port, "probe acknowledged");
                    return ProbeOutcome::Reachable { port, attempts };
                }
                Err(reason) => {
                    debug!(port, %reason, "probe failed");
                    attempts.push(ProbeAttempt { port, reason });
                }
            }
        }
        ProbeOutcome::Unreachable { attempts }
    }

    fn try_port(&self, port: u16, command: &ToolCommand) -> Result<(), String> {
        let mut session = ToolSession::connect(port, self.connect_timeout, self.ack_timeout)
            .map_err(|e| format!("connect failed: {e}"))?;
        let reply = session
            .send(command)
            .map_err(|e| format!("no acknowledgement: {e}"))?;
        if reply.ok {
            Ok(())
        } else {
            Err(format!(
                "refused: {}",
                reply.error.as_deref().unwrap_or("no reason given")
            ))
        }
    }

    fn launch(&self, file: &Path) -> HandoffOutcome {
        let path = self.executable.display().to_string();
        if !self.executable.is_file() {
            warn!(executable = %path, "RizomUV executable not found");
            return HandoffOutcome::Failed {
                error: NegotiationError::ExecutableMissing { path },
            };
        }
        match self.launcher.launch(&self.executable, file) {
            Ok(pid) => {
                info!(pid, executable = %path, "launched RizomUV");
                HandoffOutcome::Launched {
                    pid,
                    executable: self.executable.clone(),
                }
            }
            Err(e) => {
                warn!(executable = %path, error = %e, "failed to launch RizomUV");
                HandoffOutcome::Failed {
                    error: NegotiationError::SpawnFailed {
                        path,
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Behavior, FakeLauncher, closed_port, config, fake_instance};
    use super::*;
    use tempfile::NamedTempFile;

    fn file() -> PathBuf {
        PathBuf::from("/tmp/rizomuv_bridge/Body.ruvx.json")
    }

    #[test]
    fn test_candidates_preferred_first_without_duplicates() {
        let negotiator = Negotiator::with_launcher(
            &config(vec![41414, 41415, 41416], PathBuf::from("/nope")),
            FakeLauncher::default(),
        );
        assert_eq!(negotiator.candidates(None), vec![41414, 41415, 41416]);
        assert_eq!(
            negotiator.candidates(Some(41416)),
            vec![41416, 41414, 41415]
        );
        assert_eq!(negotiator.candidates(Some(5000)), vec![5000, 41414, 41415, 41416]);
    }

    #[test]
    fn test_handoff_to_acknowledging_instance() {
        let (port, commands) = fake_instance(Behavior::Reply(ToolReply::success()));
        let negotiator = Negotiator::with_launcher(
            &config(vec![port], PathBuf::from("/nope")),
            FakeLauncher::default(),
        );

        let outcome = negotiator.handoff(&file(), None);
        assert_eq!(outcome, HandoffOutcome::HandedOff { port });
        assert_eq!(
            commands.recv_timeout(Duration::from_secs(1)).unwrap(),
            ToolCommand::Load { path: file() }
        );
        assert!(negotiator.launcher().launches.borrow().is_empty());
    }

    #[test]
    fn test_preferred_port_wins_tie() {
        let (first, first_rx) = fake_instance(Behavior::Reply(ToolReply::success()));
        let (second, _second_rx) = fake_instance(Behavior::Reply(ToolReply::success()));
        let negotiator = Negotiator::with_launcher(
            &config(vec![first, second], PathBuf::from("/nope")),
            FakeLauncher::default(),
        );

        assert_eq!(
            negotiator.handoff(&file(), Some(second)),
            HandoffOutcome::HandedOff { port: second }
        );
        assert!(first_rx.try_recv().is_err());

        assert_eq!(
            negotiator.handoff(&file(), None),
            HandoffOutcome::HandedOff { port: first }
        );
    }

    #[test]
    fn test_unreachable_candidates_are_skipped() {
        let refused = closed_port();
        let (silent, _silent_rx) = fake_instance(Behavior::Silent);
        let (busy, _busy_rx) = fake_instance(Behavior::Reply(ToolReply::error("busy")));
        let (good, _good_rx) = fake_instance(Behavior::Reply(ToolReply::success()));
        let negotiator = Negotiator::with_launcher(
            &config(vec![refused, silent, busy, good], PathBuf::from("/nope")),
            FakeLauncher::default(),
        );

        match negotiator.probe(None) {
            ProbeOutcome::Reachable { port, attempts } => {
                assert_eq!(port, good);
                let ports: Vec<u16> = attempts.iter().map(|a| a.port).collect();
                assert_eq!(ports, vec![refused, silent, busy]);
                assert!(attempts[2].reason.contains("busy"));
            }
            other => panic!("expected reachable, got {other:?}"),
        }
    }

    #[test]
    fn test_launch_when_unreachable() {
        let exe = NamedTempFile::new().unwrap();
        let negotiator = Negotiator::with_launcher(
            &config(vec![closed_port()], exe.path().to_path_buf()),
            FakeLauncher::default(),
        );

        let outcome = negotiator.handoff(&file(), None);
        assert_eq!(
            outcome,
            HandoffOutcome::Launched {
                pid: 4242,
                executable: exe.path().to_path_buf(),
            }
        );
        assert_eq!(
            negotiator.launcher().launches.borrow().as_slice(),
            &[(exe.path().to_path_buf(), file())]
        );
    }

    #[test]
    fn test_missing_executable_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let exe = temp.path().join("rizomuv");
        let negotiator = Negotiator::with_launcher(
            &config(vec![closed_port()], exe.clone()),
            FakeLauncher::default(),
        );

        let outcome = negotiator.handoff(&file(), None);
        assert!(!outcome.is_success());
        assert_eq!(
            outcome,
            HandoffOutcome::Failed {
                error: NegotiationError::ExecutableMissing {
                    path: exe.display().to_string(),
                },
            }
        );
        assert!(negotiator.launcher().launches.borrow().is_empty());
    }

    #[test]
    fn test_spawn_failure_fails() {
        let exe = NamedTempFile::new().unwrap();
        let negotiator = Negotiator::with_launcher(
            &config(vec![closed_port()], exe.path().to_path_buf()),
            FakeLauncher::failing(),
        );

        match negotiator.handoff(&file(), None) {
            HandoffOutcome::Failed {
                error: NegotiationError::SpawnFailed { reason, .. },
            } => assert!(reason.contains("permission denied")),
            other => panic!("expected spawn failure, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_json() {
        let outcome = HandoffOutcome::Failed {
            error: NegotiationError::ExecutableMissing {
                path: "/nope".to_string(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["error"], "RizomUV executable not found: /nope");

        let json = serde_json::to_value(HandoffOutcome::HandedOff { port: 41414 }).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "handed_off", "port": 41414}));
    }
}
