//! Inbound request envelope: `{"type": <command>, "payload": <object> | [<string>, ...]}`.

use crate::error::BridgeError;
use serde_json::Value;

/// A decoded request: the command name plus its positional string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRequest {
    pub command: String,
    pub args: Vec<String>,
}

/// Decode a raw message body into a command and its arguments.
///
/// An object payload becomes a single argument holding its compact JSON
/// serialization. An array payload contributes one argument per element and
/// every element must be a string. A missing or `null` payload means no
/// arguments.
pub fn decode(body: &[u8]) -> Result<DecodedRequest, BridgeError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| BridgeError::Parse(format!("request is not valid UTF-8: {e}")))?;
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BridgeError::Parse(format!("request is not valid JSON: {e}")))?;
    let Value::Object(mut envelope) = value else {
        return Err(BridgeError::Parse("request must be a JSON object".into()));
    };

    let command = match envelope.remove("type") {
        Some(Value::String(s)) if !s.is_empty() => s,
        Some(Value::String(_)) => return Err(BridgeError::Parse("empty 'type' field".into())),
        Some(_) => return Err(BridgeError::Parse("'type' must be a string".into())),
        None => return Err(BridgeError::Parse("missing 'type' field".into())),
    };

    let args = match envelope.remove("payload") {
        None | Some(Value::Null) => Vec::new(),
        Some(obj @ Value::Object(_)) => vec![serde_json::to_string(&obj)?],
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::String(s) => Ok(s),
                other => Err(BridgeError::Parse(format!(
                    "payload[{idx}] must be a string, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(BridgeError::Parse(format!(
                "payload must be an object or an array of strings, got {other}"
            )));
        }
    };

    Ok(DecodedRequest { command, args })
}
