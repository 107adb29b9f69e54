//! `turtleweb-server` – The Panel Web UI Server
//!
//! Boots a lightweight HTTP + WebSocket server (default port `8080`)
//! that:
//!
//! 1. **Serves** the static control panel page (HTML/CSS/JS) at every
//!    non-WebSocket HTTP path.
//!
//! 2. **Pushes** every [`PanelState`][turtleweb_types::PanelState]
//!    change to connected browsers as JSON over a persistent WebSocket.
//!
//! 3. **Validates** inbound browser frames into
//!    [`WidgetEvent`][turtleweb_types::WidgetEvent] values at the
//!    boundary and feeds them, one at a time, into
//!    [`TurtlePanel::handle_event`][turtleweb_panel::TurtlePanel::handle_event].
//!    Frames that do not parse are dropped.

pub mod server;

pub use server::{DEFAULT_PORT, PanelServer};
