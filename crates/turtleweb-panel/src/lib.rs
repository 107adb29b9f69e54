//! `turtleweb-panel` – The Control Panel Core
//!
//! Owns the relationship between the running simulation process, the
//! UI-visible control state, and outbound commands to that process.
//! Everything here is glue with one small contract each:
//!
//! - [`mapper`] – pure translation of joystick/button input into motion
//!   commands and service requests. No state, no I/O.
//! - [`state`] – [`StateStore`][state::StateStore]: the UI-visible
//!   key-value state behind a watch channel.
//! - [`lifecycle`] – [`LaunchBridge`][lifecycle::LaunchBridge]: at most
//!   one tracked simulation process, toggle start/stop semantics.
//! - [`params`] – [`ParameterMirror`][params::ParameterMirror]: the local
//!   ordered copy of the node's background color parameters.
//! - [`pose`] – [`PoseRelay`][pose::PoseRelay]: change-suppressed pose
//!   republishing into the state store.
//! - [`panel`] – [`TurtlePanel`][panel::TurtlePanel]: the single widget
//!   event dispatch point tying the above together.

pub mod lifecycle;
pub mod mapper;
pub mod panel;
pub mod params;
pub mod pose;
pub mod state;

pub use lifecycle::{LaunchBridge, Toggle};
pub use panel::{LaunchTarget, TurtlePanel};
pub use state::StateStore;

#[cfg(test)]
pub(crate) mod testutil;
