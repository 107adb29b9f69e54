//! Pure input-to-command translation. No state, no I/O.
//!
//! Two joystick encodings are supported: the continuous stick vector
//! (±[`VECTOR_RANGE`] per axis, normalised and scaled by
//! [`VECTOR_GAIN`]) and the discrete nudge (direction plus distance,
//! scaled by [`NUDGE_SCALE`]). A nudge drives exactly one of the two
//! velocity axes, never both.

use turtleweb_types::{JoystickDirection, JoystickInput, MotionCommand, ServiceKind};

/// Half-range of the raw stick displacement per axis.
pub const VECTOR_RANGE: f64 = 50.0;

/// Velocity gain applied to the normalised stick vector.
pub const VECTOR_GAIN: f64 = 3.0;

/// Velocity per unit of nudge distance.
pub const NUDGE_SCALE: f64 = 0.02;

/// Map one joystick event to a motion command.
///
/// `Start`/`End` phases produce no command. For `Move`, the sign of the
/// angular term is inverted so a rightward stick yields clockwise
/// rotation.
pub fn map_joystick(input: JoystickInput) -> Option<MotionCommand> {
    match input {
        JoystickInput::Move { x, y } => Some(MotionCommand {
            linear_x: VECTOR_GAIN * y / VECTOR_RANGE,
            angular_z: -VECTOR_GAIN * x / VECTOR_RANGE,
        }),
        JoystickInput::Nudge {
            direction,
            distance,
        } => {
            let scale = NUDGE_SCALE * distance.abs();
            let (linear, angular) = match direction {
                JoystickDirection::Forward => (scale, 0.0),
                JoystickDirection::Backward => (-scale, 0.0),
                JoystickDirection::Left => (0.0, scale),
                JoystickDirection::Right => (0.0, -scale),
            };
            Some(MotionCommand {
                linear_x: linear,
                angular_z: angular,
            })
        }
        JoystickInput::Start | JoystickInput::End => None,
    }
}

/// Map a service button index to its remote operation. Indexes beyond
/// the two known buttons are discarded.
pub fn map_service(index: u32) -> Option<ServiceKind> {
    match index {
        0 => Some(ServiceKind::Clear),
        1 => Some(ServiceKind::Reset),
        _ => None,
    }
}
