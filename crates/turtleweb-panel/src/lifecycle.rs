//! [`LaunchBridge`] – owns the one tracked simulation process.
//!
//! Launch is a toggle: with no process tracked a launch request spawns
//! one; with a process tracked it requests termination and changes no
//! state. The definitive Running → Idle transition happens only when
//! the exit notification arrives, whether the exit was requested or
//! unexpected.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, trace};

use crate::state::StateStore;
use turtleweb_client::{NodeLauncher, ProcessEvent, ProcessHandle};
use turtleweb_types::{LaunchLabel, StatePatch};

/// Process events buffered between the launcher and the pump task.
const EVENT_QUEUE: usize = 64;

/// Outcome of a launch toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// A new process was spawned; the caller should fetch parameters.
    Spawned,
    /// A process was already tracked; termination was requested.
    StopRequested,
    /// Spawning failed; logged, state unchanged, a retry is just
    /// another toggle.
    SpawnFailed,
}

pub struct LaunchBridge {
    launcher: Arc<dyn NodeLauncher>,
    state: Arc<StateStore>,
    process: Mutex<Option<ProcessHandle>>,
    package: String,
    executable: String,
    events_tx: mpsc::Sender<ProcessEvent>,
}

impl LaunchBridge {
    /// Build the bridge plus the process-event receiver that must be
    /// handed to [`pump_process_events`].
    pub fn new(
        launcher: Arc<dyn NodeLauncher>,
        state: Arc<StateStore>,
        package: impl Into<String>,
        executable: impl Into<String>,
    ) -> (Arc<Self>, mpsc::Receiver<ProcessEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let bridge = Arc::new(Self {
            launcher,
            state,
            process: Mutex::new(None),
            package: package.into(),
            executable: executable.into(),
            events_tx,
        });
        (bridge, events_rx)
    }

    /// Start the simulation if idle, otherwise request termination of
    /// the tracked process. Never spawns a second process.
    pub async fn toggle_launch(&self) -> Toggle {
        let mut slot = self.process.lock().await;
        if let Some(handle) = slot.as_ref() {
            handle.shutdown();
            debug!(target: "turtleweb::lifecycle", "termination requested");
            return Toggle::StopRequested;
        }

        match self
            .launcher
            .spawn(&self.package, &self.executable, self.events_tx.clone())
            .await
        {
            Ok(handle) => {
                *slot = Some(handle);
                // Patch while still holding the slot: an exit arriving
                // during the spawn serializes on the same lock, so its
                // reset is ordered strictly after this.
                self.state.set(StatePatch {
                    launch_button_label: Some(LaunchLabel::Stop),
                    disable: Some(false),
                    ..Default::default()
                });
                Toggle::Spawned
            }
            Err(e) => {
                // Non-fatal: the panel stays in its pre-launch state.
                error!(target: "turtleweb::lifecycle", error = %e, "simulation spawn failed");
                Toggle::SpawnFailed
            }
        }
    }

    /// Handle the exit notification: drop the tracked handle and reset
    /// the UI to its pre-launch form, clearing the mirrored parameters.
    /// Runs unconditionally, requested exit or not.
    pub async fn handle_exit(&self) {
        self.process.lock().await.take();
        self.state.set(StatePatch {
            launch_button_label: Some(LaunchLabel::Start),
            disable: Some(true),
            params: Some(Vec::new()),
            ..Default::default()
        });
    }

    /// Request termination of the tracked process, if any. Used by the
    /// panel's shutdown hook; the exit event still drives the state.
    pub async fn shutdown_tracked(&self) -> bool {
        match self.process.lock().await.as_ref() {
            Some(handle) => {
                handle.shutdown();
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.process.lock().await.is_some()
    }
}

/// Drain process events until the channel closes. Start/stdout/stderr
/// are diagnostics only; exit drives the state transition.
pub async fn pump_process_events(bridge: Arc<LaunchBridge>, mut rx: mpsc::Receiver<ProcessEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProcessEvent::Started => {
                debug!(target: "turtleweb::lifecycle", "simulation started");
            }
            ProcessEvent::Stdout(line) => {
                trace!(target: "turtleweb::lifecycle", line, "sim stdout");
            }
            ProcessEvent::Stderr(line) => {
                trace!(target: "turtleweb::lifecycle", line, "sim stderr");
            }
            ProcessEvent::Exited { code } => {
                info!(target: "turtleweb::lifecycle", ?code, "simulation exited");
                bridge.handle_exit().await;
            }
        }
    }
}
