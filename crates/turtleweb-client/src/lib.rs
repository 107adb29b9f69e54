//! `turtleweb-client` – The Middleware Layer
//!
//! Everything that talks to the ROS 2 side lives here. The panel core
//! never opens a socket or spawns a process itself; it goes through the
//! two traits this crate defines.
//!
//! # Modules
//!
//! - [`adapter`] – [`Ros2Client`] and [`NodeLauncher`], the traits every
//!   middleware backend must implement.
//! - [`frames`] – pure builders/parsers for the rosbridge v2 JSON
//!   protocol and the `rcl_interfaces` parameter service payloads.
//! - [`rosbridge`] – [`RosbridgeClient`], the production [`Ros2Client`]
//!   over a rosbridge WebSocket with request/response correlation.
//! - [`launcher`] – [`Ros2Run`], the production [`NodeLauncher`] that
//!   shells out to `ros2 run` and supervises the child process.

pub mod adapter;
pub mod frames;
pub mod launcher;
pub mod rosbridge;

pub use adapter::{NodeLauncher, Ros2Client};
pub use launcher::{ProcessEvent, ProcessHandle, Ros2Run};
pub use rosbridge::RosbridgeClient;
