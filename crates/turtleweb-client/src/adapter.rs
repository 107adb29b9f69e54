//! The middleware client traits.
//!
//! The panel never speaks rosbridge or `tokio::process` directly. It
//! holds a [`Ros2Client`] for topics, services, and parameters, and a
//! [`NodeLauncher`] for the one simulation child process. Tests swap in
//! mock implementations of both.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use turtleweb_types::{PanelError, Parameter};

use crate::frames;
use crate::launcher::{ProcessEvent, ProcessHandle};

/// Topic/service/parameter primitives against the robotics middleware.
///
/// # Contract
///
/// * `publish` on the command channel may fail; callers decide whether a
///   lost message matters (joystick commands are swallowed-and-logged).
/// * `call_service` resolves once the remote responds, or errors.
/// * `get_parameters` / `set_parameters` are provided methods built on
///   `call_service` using the `rcl_interfaces` service shapes; backends
///   with a native parameter API may override them.
#[async_trait]
pub trait Ros2Client: Send + Sync {
    /// Advertise `topic` so subsequent publishes are accepted.
    async fn advertise(&self, topic: &str, msg_type: &str) -> Result<(), PanelError>;

    /// Withdraw a previous advertisement.
    async fn unadvertise(&self, topic: &str) -> Result<(), PanelError>;

    /// Publish `msg` on `topic`.
    async fn publish(&self, topic: &str, msg: Value) -> Result<(), PanelError>;

    /// Subscribe to `topic`; every inbound message is fanned out to the
    /// returned receiver as its raw JSON body.
    async fn subscribe(
        &self,
        topic: &str,
        msg_type: &str,
    ) -> Result<broadcast::Receiver<Value>, PanelError>;

    /// Drop the subscription on `topic`.
    async fn unsubscribe(&self, topic: &str) -> Result<(), PanelError>;

    /// Report whether `service` is available, waiting up to `timeout`.
    async fn wait_for_service(&self, service: &str, timeout: Duration) -> bool;

    /// Call `service` with `args` and return the response values.
    async fn call_service(
        &self,
        service: &str,
        srv_type: &str,
        args: Value,
    ) -> Result<Value, PanelError>;

    /// Fetch the named integer parameters from `node`, in request order.
    async fn get_parameters(
        &self,
        node: &str,
        names: &[String],
    ) -> Result<Vec<i64>, PanelError> {
        let service = format!("/{node}/get_parameters");
        let values = self
            .call_service(
                &service,
                frames::GET_PARAMETERS_TYPE,
                frames::get_parameters_args(names),
            )
            .await?;
        frames::parse_integer_values(&values, names.len()).map_err(|details| {
            PanelError::Parameter {
                node: node.to_string(),
                details,
            }
        })
    }

    /// Push the given integer parameters to `node`.
    async fn set_parameters(
        &self,
        node: &str,
        params: &[Parameter],
    ) -> Result<(), PanelError> {
        let service = format!("/{node}/set_parameters");
        self.call_service(
            &service,
            frames::SET_PARAMETERS_TYPE,
            frames::set_parameters_args(params),
        )
        .await
        .map(|_| ())
    }
}

/// Child-process spawn/monitor primitive for the simulation node.
///
/// Lifecycle notifications (start, stdout/stderr lines, exit) arrive on
/// the `events` channel handed to [`spawn`][NodeLauncher::spawn]. The
/// returned [`ProcessHandle`] only *requests* termination; the definitive
/// state transition happens when [`ProcessEvent::Exited`] is delivered.
#[async_trait]
pub trait NodeLauncher: Send + Sync {
    async fn spawn(
        &self,
        package: &str,
        executable: &str,
        events: mpsc::Sender<ProcessEvent>,
    ) -> Result<ProcessHandle, PanelError>;
}
