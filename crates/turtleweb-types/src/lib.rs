use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label shown on the launch button, mirrored verbatim into the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LaunchLabel {
    Start,
    Stop,
}

impl std::fmt::Display for LaunchLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchLabel::Start => write!(f, "START"),
            LaunchLabel::Stop => write!(f, "STOP"),
        }
    }
}

/// A named integer parameter mirrored from the remote node.
///
/// `id` is stable per UI element so an incoming edit can be matched
/// against the existing ordered list; `name` is the middleware-side key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub name: String,
    pub value: i64,
}

/// The UI-visible control state. Created once with defaults and mutated
/// only through [`StatePatch`]; it lives for the panel lifetime.
///
/// `x` and `y` are single-element sequences holding the last known pose,
/// matching the shape the panel widgets bind to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelState {
    pub launch_button_label: LaunchLabel,
    pub disable: bool,
    pub node_name: String,
    pub params: Vec<Parameter>,
    pub x: [f64; 1],
    pub y: [f64; 1],
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            launch_button_label: LaunchLabel::Start,
            disable: true,
            node_name: "turtlesim".to_string(),
            params: Vec::new(),
            x: [5.0],
            y: [5.0],
        }
    }
}

/// Partial update against [`PanelState`]. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub launch_button_label: Option<LaunchLabel>,
    pub disable: Option<bool>,
    pub params: Option<Vec<Parameter>>,
    pub x: Option<[f64; 1]>,
    pub y: Option<[f64; 1]>,
}

impl StatePatch {
    /// Apply this patch to `state` in place.
    pub fn apply_to(&self, state: &mut PanelState) {
        if let Some(label) = self.launch_button_label {
            state.launch_button_label = label;
        }
        if let Some(disable) = self.disable {
            state.disable = disable;
        }
        if let Some(params) = &self.params {
            state.params = params.clone();
        }
        if let Some(x) = self.x {
            state.x = x;
        }
        if let Some(y) = self.y {
            state.y = y;
        }
    }
}

/// Velocity command produced from a single joystick event. Transient;
/// one per event, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub linear_x: f64,
    pub angular_z: f64,
}

impl MotionCommand {
    pub const ZERO: MotionCommand = MotionCommand {
        linear_x: 0.0,
        angular_z: 0.0,
    };
}

/// Which of the two idempotent remote operations a service button maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Clear,
    Reset,
}

/// Discrete joystick direction for the nudge encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoystickDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// One joystick event, validated at the server boundary.
///
/// Two encodings are accepted: `Move` carries the raw stick displacement
/// (±50 units per axis), `Nudge` carries a discrete direction plus a
/// distance magnitude. `Start`/`End` phases never produce a command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum JoystickInput {
    Move { x: f64, y: f64 },
    Nudge { direction: JoystickDirection, distance: f64 },
    Start,
    End,
}

/// A single-field parameter edit coming from the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEdit {
    pub id: String,
    pub name: String,
    pub value: i64,
}

/// Tagged union of every widget event the panel understands.
///
/// The server validates inbound browser frames into this type before any
/// handler logic runs; frames that do not parse are dropped at the
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum WidgetEvent {
    Launch,
    Service { index: u32 },
    Joystick(JoystickInput),
    ParamEdit(ParamEdit),
}

/// A `turtlesim/msg/Pose` report. Only `x` and `y` are consumed by the
/// panel; the remaining fields are accepted so live wire traffic parses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub linear_velocity: f64,
    #[serde(default)]
    pub angular_velocity: f64,
}

/// Global error type spanning process spawning, the rosbridge transport,
/// and remote service/parameter calls.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("process spawn failed: {0}")]
    Spawn(String),

    #[error("publish on '{topic}' failed: {details}")]
    Publish { topic: String, details: String },

    #[error("rosbridge transport error: {0}")]
    Transport(String),

    #[error("service '{service}' unavailable after {attempts} attempts")]
    ServiceUnavailable { service: String, attempts: u32 },

    #[error("service call '{service}' failed: {details}")]
    Service { service: String, details: String },

    #[error("parameter operation on node '{node}' failed: {details}")]
    Parameter { node: String, details: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("connection closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_label_serialises_uppercase() {
        let json = serde_json::to_string(&LaunchLabel::Start).unwrap();
        assert_eq!(json, "\"START\"");
        let json = serde_json::to_string(&LaunchLabel::Stop).unwrap();
        assert_eq!(json, "\"STOP\"");
        assert_eq!(LaunchLabel::Start.to_string(), "START");
    }

    #[test]
    fn panel_state_defaults_match_pre_launch_ui() {
        let state = PanelState::default();
        assert_eq!(state.launch_button_label, LaunchLabel::Start);
        assert!(state.disable);
        assert_eq!(state.node_name, "turtlesim");
        assert!(state.params.is_empty());
        assert_eq!(state.x, [5.0]);
        assert_eq!(state.y, [5.0]);
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut state = PanelState::default();
        let patch = StatePatch {
            launch_button_label: Some(LaunchLabel::Stop),
            disable: Some(false),
            ..Default::default()
        };
        patch.apply_to(&mut state);
        assert_eq!(state.launch_button_label, LaunchLabel::Stop);
        assert!(!state.disable);
        // Untouched fields keep their values.
        assert_eq!(state.node_name, "turtlesim");
        assert_eq!(state.x, [5.0]);
    }

    #[test]
    fn widget_event_launch_roundtrip() {
        let json = r#"{"widget":"launch"}"#;
        let event: WidgetEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, WidgetEvent::Launch);
    }

    #[test]
    fn widget_event_joystick_move_roundtrip() {
        let json = r#"{"widget":"joystick","phase":"move","x":25.0,"y":-10.0}"#;
        let event: WidgetEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            WidgetEvent::Joystick(JoystickInput::Move { x: 25.0, y: -10.0 })
        );
    }

    #[test]
    fn widget_event_joystick_nudge_roundtrip() {
        let json =
            r#"{"widget":"joystick","phase":"nudge","direction":"FORWARD","distance":10.0}"#;
        let event: WidgetEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            WidgetEvent::Joystick(JoystickInput::Nudge {
                direction: JoystickDirection::Forward,
                distance: 10.0,
            })
        );
    }

    #[test]
    fn widget_event_param_edit_roundtrip() {
        let json = r#"{"widget":"param_edit","id":"param-background_g","name":"background_g","value":200}"#;
        let event: WidgetEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event,
            WidgetEvent::ParamEdit(ParamEdit {
                id: "param-background_g".to_string(),
                name: "background_g".to_string(),
                value: 200,
            })
        );
    }

    #[test]
    fn pose_parses_with_missing_velocity_fields() {
        let json = r#"{"x":1.5,"y":2.5,"theta":0.1}"#;
        let pose: Pose = serde_json::from_str(json).unwrap();
        assert!((pose.x - 1.5).abs() < f64::EPSILON);
        assert!((pose.y - 2.5).abs() < f64::EPSILON);
        assert_eq!(pose.linear_velocity, 0.0);
    }

    #[test]
    fn panel_error_display() {
        let err = PanelError::ServiceUnavailable {
            service: "/clear".to_string(),
            attempts: 30,
        };
        assert!(err.to_string().contains("/clear"));
        assert!(err.to_string().contains("30"));

        let err2 = PanelError::Publish {
            topic: "turtle1/cmd_vel".to_string(),
            details: "sink closed".to_string(),
        };
        assert!(err2.to_string().contains("turtle1/cmd_vel"));
    }
}
