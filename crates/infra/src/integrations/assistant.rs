//! Assistant tool-call boundary.
//!
//! The LLM emits untyped JSON tool-call arguments. This is the single place
//! they become typed: the payload is validated against the intent union and
//! anything malformed is rejected with a descriptive reason before it can
//! reach the admission path.

use serde_json::Value;
use taskbridge_domain::{Result, TaskBridgeError, ToolIntent};

/// Validate one raw tool-call payload into a typed intent.
///
/// Expected shape: an object whose `tool` field names the operation, with
/// the operation's arguments inline (e.g. `{"tool": "delete_task", "id":
/// "..."}`).
pub fn parse_intent(raw: Value) -> Result<ToolIntent> {
    let Some(object) = raw.as_object() else {
        return Err(TaskBridgeError::InvalidInput(
            "tool call payload must be a JSON object".into(),
        ));
    };

    let Some(tool) = object.get("tool").and_then(Value::as_str) else {
        return Err(TaskBridgeError::InvalidInput(
            "tool call payload is missing the \"tool\" tag".into(),
        ));
    };
    let tool = tool.to_string();

    serde_json::from_value(raw).map_err(|err| {
        TaskBridgeError::InvalidInput(format!("invalid arguments for tool \"{tool}\": {err}"))
    })
}
