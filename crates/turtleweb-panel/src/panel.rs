//! [`TurtlePanel`] – the single widget-event dispatch point.
//!
//! The host loop feeds every validated [`WidgetEvent`] into
//! [`handle_event`][TurtlePanel::handle_event], one at a time. All
//! handler failures are caught and logged at this boundary; none may
//! crash the host loop. The only user-visible failure signal is the UI
//! state staying in its pre-action form.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tracing::{error, info, trace, warn};

use crate::lifecycle::{LaunchBridge, Toggle, pump_process_events};
use crate::mapper::{map_joystick, map_service};
use crate::params::ParameterMirror;
use crate::pose::PoseRelay;
use crate::state::StateStore;
use turtleweb_client::{NodeLauncher, ProcessEvent, Ros2Client, frames};
use turtleweb_types::{PanelError, PanelState, Pose, ServiceKind, WidgetEvent};

pub const CMD_VEL_TOPIC: &str = "turtle1/cmd_vel";
pub const POSE_TOPIC: &str = "turtle1/pose";
const TWIST_TYPE: &str = "geometry_msgs/msg/Twist";
const POSE_TYPE: &str = "turtlesim/msg/Pose";
const EMPTY_TYPE: &str = "std_srvs/srv/Empty";
const CLEAR_SERVICE: &str = "/clear";
const RESET_SERVICE: &str = "/reset";

/// Interval between service availability probes.
const SERVICE_POLL: Duration = Duration::from_secs(1);

/// Bounded replacement for the indefinite availability wait: after this
/// many probes the call is reported as unavailable instead of hanging
/// the handler forever.
pub const SERVICE_WAIT_ATTEMPTS: u32 = 30;

/// What `toggle_launch` should start and which node it shows up as.
#[derive(Debug, Clone)]
pub struct LaunchTarget {
    pub package: String,
    pub executable: String,
    /// Node name used for parameter calls, seeded into the state.
    pub node_name: String,
}

impl Default for LaunchTarget {
    fn default() -> Self {
        Self {
            package: "turtlesim".to_string(),
            executable: "turtlesim_node".to_string(),
            node_name: "turtlesim".to_string(),
        }
    }
}

pub struct TurtlePanel {
    client: Arc<dyn Ros2Client>,
    state: Arc<StateStore>,
    bridge: Arc<LaunchBridge>,
    mirror: ParameterMirror,
    // Taken once by on_startup to start the process-event pump.
    process_events: Mutex<Option<mpsc::Receiver<ProcessEvent>>>,
}

impl TurtlePanel {
    pub fn new(
        client: Arc<dyn Ros2Client>,
        launcher: Arc<dyn NodeLauncher>,
        target: LaunchTarget,
    ) -> Self {
        let state = Arc::new(StateStore::new(PanelState {
            node_name: target.node_name,
            ..Default::default()
        }));
        let (bridge, events_rx) = LaunchBridge::new(
            launcher,
            Arc::clone(&state),
            target.package,
            target.executable,
        );
        let mirror = ParameterMirror::new(Arc::clone(&client), Arc::clone(&state));
        Self {
            client,
            state,
            bridge,
            mirror,
            process_events: Mutex::new(Some(events_rx)),
        }
    }

    pub fn state_snapshot(&self) -> PanelState {
        self.state.snapshot()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }

    /// Acquire middleware resources and start the background pumps.
    pub async fn on_startup(&self) -> Result<(), PanelError> {
        self.client.advertise(CMD_VEL_TOPIC, TWIST_TYPE).await?;
        let pose_rx = self.client.subscribe(POSE_TOPIC, POSE_TYPE).await?;
        tokio::spawn(relay_pose_stream(Arc::clone(&self.state), pose_rx));

        if let Some(events_rx) = self.process_events.lock().await.take() {
            tokio::spawn(pump_process_events(Arc::clone(&self.bridge), events_rx));
        }
        Ok(())
    }

    /// Release middleware resources and request termination of a still
    /// tracked simulation process.
    pub async fn on_shutdown(&self) -> Result<(), PanelError> {
        if self.bridge.shutdown_tracked().await {
            info!(target: "turtleweb::panel", "shutdown: simulation termination requested");
        }
        self.client.unsubscribe(POSE_TOPIC).await?;
        self.client.unadvertise(CMD_VEL_TOPIC).await?;
        Ok(())
    }

    /// Handle one widget event. Never propagates an error to the host
    /// loop; failures are logged here.
    pub async fn handle_event(&self, event: WidgetEvent) {
        if let Err(e) = self.dispatch(event).await {
            error!(target: "turtleweb::panel", error = %e, "widget handler failed");
        }
    }

    async fn dispatch(&self, event: WidgetEvent) -> Result<(), PanelError> {
        match event {
            WidgetEvent::Launch => {
                if self.bridge.toggle_launch().await == Toggle::Spawned {
                    self.mirror.fetch().await?;
                }
                Ok(())
            }
            WidgetEvent::Joystick(input) => {
                if let Some(cmd) = map_joystick(input) {
                    // Publish failures lose this one command; logged,
                    // not retried, not propagated.
                    if let Err(e) = self.client.publish(CMD_VEL_TOPIC, frames::twist(cmd)).await {
                        warn!(target: "turtleweb::panel", error = %e, "cmd_vel publish failed");
                    }
                }
                Ok(())
            }
            WidgetEvent::Service { index } => match map_service(index) {
                Some(kind) => self.invoke_service(kind).await,
                None => Ok(()),
            },
            WidgetEvent::ParamEdit(edit) => self.mirror.apply_edit(edit).await,
        }
    }

    async fn invoke_service(&self, kind: ServiceKind) -> Result<(), PanelError> {
        let service = match kind {
            ServiceKind::Clear => CLEAR_SERVICE,
            ServiceKind::Reset => RESET_SERVICE,
        };
        // The interval paces the attempts: a probe that burns its full
        // timeout is followed immediately, a fast negative waits out the
        // rest of the tick, and the final failure is reported without a
        // trailing sleep.
        let mut tick = tokio::time::interval(SERVICE_POLL);
        for attempt in 1..=SERVICE_WAIT_ATTEMPTS {
            tick.tick().await;
            if self.client.wait_for_service(service, SERVICE_POLL).await {
                self.client.call_service(service, EMPTY_TYPE, json!({})).await?;
                return Ok(());
            }
            info!(target: "turtleweb::panel", service, attempt, "service not available, waiting again");
        }
        Err(PanelError::ServiceUnavailable {
            service: service.to_string(),
            attempts: SERVICE_WAIT_ATTEMPTS,
        })
    }
}

/// Feed the pose subscription through a [`PoseRelay`] into the state
/// store until the middleware closes the stream.
async fn relay_pose_stream(
    state: Arc<StateStore>,
    mut rx: broadcast::Receiver<serde_json::Value>,
) {
    let snap = state.snapshot();
    let mut relay = PoseRelay::new(snap.x[0], snap.y[0]);
    loop {
        match rx.recv().await {
            Ok(msg) => {
                let Ok(pose) = serde_json::from_value::<Pose>(msg) else {
                    trace!(target: "turtleweb::panel", "dropping malformed pose message");
                    continue;
                };
                if let Some(patch) = relay.observe(pose.x, pose.y) {
                    state.set(patch);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(target: "turtleweb::panel", lagged_by = n, "pose stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
