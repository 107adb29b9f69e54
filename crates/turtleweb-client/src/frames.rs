//! Pure builders and parsers for the rosbridge v2 JSON protocol.
//!
//! Nothing here does I/O; [`RosbridgeClient`][crate::rosbridge::RosbridgeClient]
//! turns these values into WebSocket frames. The parameter payloads
//! reproduce the `rcl_interfaces` service shapes exactly, since the
//! remote node validates them.

use serde_json::{Value, json};
use turtleweb_types::{MotionCommand, Parameter};

/// Service type for `/{node}/get_parameters`.
pub const GET_PARAMETERS_TYPE: &str = "rcl_interfaces/srv/GetParameters";

/// Service type for `/{node}/set_parameters`.
pub const SET_PARAMETERS_TYPE: &str = "rcl_interfaces/srv/SetParameters";

/// `rcl_interfaces/msg/ParameterType` discriminant for integers.
pub const PARAMETER_INTEGER: u8 = 2;

/// Build an `advertise` frame.
pub fn advertise(topic: &str, msg_type: &str) -> Value {
    json!({ "op": "advertise", "topic": topic, "type": msg_type })
}

/// Build an `unadvertise` frame.
pub fn unadvertise(topic: &str) -> Value {
    json!({ "op": "unadvertise", "topic": topic })
}

/// Build a `publish` frame carrying `msg`.
pub fn publish(topic: &str, msg: Value) -> Value {
    json!({ "op": "publish", "topic": topic, "msg": msg })
}

/// Build a `subscribe` frame.
pub fn subscribe(topic: &str, msg_type: &str) -> Value {
    json!({ "op": "subscribe", "topic": topic, "type": msg_type })
}

/// Build an `unsubscribe` frame.
pub fn unsubscribe(topic: &str) -> Value {
    json!({ "op": "unsubscribe", "topic": topic })
}

/// Build a `call_service` frame. `id` correlates the eventual
/// `service_response` frame back to the caller.
pub fn call_service(id: &str, service: &str, srv_type: &str, args: Value) -> Value {
    json!({
        "op": "call_service",
        "id": id,
        "service": service,
        "type": srv_type,
        "args": args
    })
}

/// Build the `geometry_msgs/msg/Twist` body for a motion command.
///
/// Only `linear.x` and `angular.z` are ever non-zero; the other axes are
/// part of the wire contract and always zero.
pub fn twist(cmd: MotionCommand) -> Value {
    json!({
        "linear":  { "x": cmd.linear_x, "y": 0.0, "z": 0.0 },
        "angular": { "x": 0.0, "y": 0.0, "z": cmd.angular_z }
    })
}

/// Build the args for a `GetParameters` call.
pub fn get_parameters_args(names: &[String]) -> Value {
    json!({ "names": names })
}

/// Build the args for a `SetParameters` call, integer-typed.
pub fn set_parameters_args(params: &[Parameter]) -> Value {
    let parameters: Vec<Value> = params
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "value": { "type": PARAMETER_INTEGER, "integer_value": p.value }
            })
        })
        .collect();
    json!({ "parameters": parameters })
}

/// Extract `expected` integer values from a `GetParameters` response body.
pub fn parse_integer_values(values: &Value, expected: usize) -> Result<Vec<i64>, String> {
    let entries = values
        .get("values")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "response has no 'values' array".to_string())?;
    if entries.len() != expected {
        return Err(format!(
            "expected {expected} parameter values, got {}",
            entries.len()
        ));
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .get("integer_value")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| format!("value {i} has no integer_value"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twist_zeroes_unused_axes() {
        let frame = twist(MotionCommand {
            linear_x: 0.6,
            angular_z: -0.2,
        });
        assert_eq!(frame["linear"]["x"], 0.6);
        assert_eq!(frame["linear"]["y"], 0.0);
        assert_eq!(frame["linear"]["z"], 0.0);
        assert_eq!(frame["angular"]["x"], 0.0);
        assert_eq!(frame["angular"]["y"], 0.0);
        assert_eq!(frame["angular"]["z"], -0.2);
    }

    #[test]
    fn publish_frame_wraps_msg() {
        let frame = publish("turtle1/cmd_vel", twist(MotionCommand::ZERO));
        assert_eq!(frame["op"], "publish");
        assert_eq!(frame["topic"], "turtle1/cmd_vel");
        assert_eq!(frame["msg"]["linear"]["x"], 0.0);
    }

    #[test]
    fn call_service_frame_carries_id_and_type() {
        let frame = call_service("req-1", "/clear", "std_srvs/srv/Empty", json!({}));
        assert_eq!(frame["op"], "call_service");
        assert_eq!(frame["id"], "req-1");
        assert_eq!(frame["service"], "/clear");
        assert_eq!(frame["type"], "std_srvs/srv/Empty");
    }

    #[test]
    fn set_parameters_args_are_integer_typed() {
        let params = vec![Parameter {
            id: "param-background_r".to_string(),
            name: "background_r".to_string(),
            value: 200,
        }];
        let args = set_parameters_args(&params);
        let entry = &args["parameters"][0];
        assert_eq!(entry["name"], "background_r");
        assert_eq!(entry["value"]["type"], PARAMETER_INTEGER);
        assert_eq!(entry["value"]["integer_value"], 200);
    }

    #[test]
    fn get_parameters_args_name_exactly_the_request() {
        let names = vec!["background_b".to_string(), "background_g".to_string()];
        let args = get_parameters_args(&names);
        assert_eq!(args["names"][0], "background_b");
        assert_eq!(args["names"][1], "background_g");
    }

    #[test]
    fn parse_integer_values_happy_path() {
        let body = json!({
            "values": [
                { "type": 2, "integer_value": 255 },
                { "type": 2, "integer_value": 86 },
                { "type": 2, "integer_value": 69 }
            ]
        });
        let values = parse_integer_values(&body, 3).unwrap();
        assert_eq!(values, vec![255, 86, 69]);
    }

    #[test]
    fn parse_integer_values_rejects_count_mismatch() {
        let body = json!({ "values": [{ "type": 2, "integer_value": 1 }] });
        assert!(parse_integer_values(&body, 3).is_err());
    }

    #[test]
    fn parse_integer_values_rejects_missing_array() {
        assert!(parse_integer_values(&json!({ "result": true }), 3).is_err());
    }
}
