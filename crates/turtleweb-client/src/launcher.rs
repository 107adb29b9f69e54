//! [`Ros2Run`] – child-process launcher for the simulation node.
//!
//! Spawns `ros2 run <package> <executable>` with piped stdout/stderr and
//! supervises it from a background task. Lifecycle notifications are
//! delivered over an [`mpsc`] channel as [`ProcessEvent`] values; the
//! returned [`ProcessHandle`] can only *request* termination.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::adapter::NodeLauncher;
use turtleweb_types::PanelError;

/// Pending termination requests buffered per process.
const KILL_QUEUE: usize = 4;

/// Lifecycle notification from a spawned simulation process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started,
    Stdout(String),
    Stderr(String),
    /// The process ended. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32> },
}

/// Handle to a running simulation process.
///
/// [`shutdown`][ProcessHandle::shutdown] requests termination; the
/// definitive state transition happens only when the supervisor delivers
/// [`ProcessEvent::Exited`], which covers unexpected exits the same way.
#[derive(Debug)]
pub struct ProcessHandle {
    kill_tx: mpsc::Sender<()>,
}

impl ProcessHandle {
    /// Build a handle around a kill-request channel. Intended for
    /// [`NodeLauncher`] implementations (including test mocks).
    pub fn new(kill_tx: mpsc::Sender<()>) -> Self {
        Self { kill_tx }
    }

    /// Request termination. Best effort: repeated calls queue at most
    /// [`KILL_QUEUE`] requests and the supervisor acts on the first.
    pub fn shutdown(&self) {
        let _ = self.kill_tx.try_send(());
    }
}

/// Launcher that shells out to the `ros2` CLI.
pub struct Ros2Run {
    program: String,
}

impl Ros2Run {
    pub fn new() -> Self {
        Self {
            program: "ros2".to_string(),
        }
    }

    /// Override the launcher binary (builder-style). Used by tests to
    /// substitute a plain executable for the `ros2` CLI.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for Ros2Run {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeLauncher for Ros2Run {
    async fn spawn(
        &self,
        package: &str,
        executable: &str,
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<ProcessHandle, PanelError> {
        let mut child = Command::new(&self.program)
            .arg("run")
            .arg(package)
            .arg(executable)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PanelError::Spawn(format!(
                    "{} run {package} {executable}: {e}",
                    self.program
                ))
            })?;

        debug!(target: "turtleweb::launcher", package, executable, "process spawned");
        let _ = events.send(ProcessEvent::Started).await;

        if let Some(stdout) = child.stdout.take() {
            let tx = events.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(ProcessEvent::Stdout(line)).await.is_err() {
                        break;
                    }
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = events.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(ProcessEvent::Stderr(line)).await.is_err() {
                        break;
                    }
                }
            });
        }

        let (kill_tx, mut kill_rx) = mpsc::channel::<()>(KILL_QUEUE);
        tokio::spawn(async move {
            let code = loop {
                tokio::select! {
                    status = child.wait() => {
                        break status.ok().and_then(|s| s.code());
                    }
                    Some(_) = kill_rx.recv() => {
                        if let Err(e) = child.start_kill() {
                            warn!(target: "turtleweb::launcher", error = %e, "kill request failed");
                        }
                    }
                }
            };
            debug!(target: "turtleweb::launcher", ?code, "process exited");
            let _ = events.send(ProcessEvent::Exited { code }).await;
        });

        Ok(ProcessHandle::new(kill_tx))
    }
}
