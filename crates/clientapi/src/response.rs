//! Backend JSON-RPC replies and the client-facing response envelope.

use crate::error::BridgeError;
use serde::Serialize;
use serde_json::Value;

/// HTTP-style status reported in a success envelope.
pub const STATUS_OK: u16 = 200;

/// HTTP-style status reported in a failure envelope.
pub const STATUS_ERROR: u16 = 400;

/// Last-resort reply body if an envelope ever fails to serialize.
const FALLBACK_BODY: &[u8] =
    br#"{"errors":{"status":400,"message":"internal error","code":"internal_error"}}"#;

// ---------------------------------------------------------------------------
// RPC reply
// ---------------------------------------------------------------------------

/// A parsed JSON-RPC 1.0 reply: `{"result": .., "error": .., "id": ..}`.
///
/// Absent members are stored as `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    pub result: Value,
    pub error: Value,
    pub id: Value,
}

impl RpcReply {
    pub fn success(result: Value) -> Self {
        Self {
            result,
            error: Value::Null,
            id: Value::from(1),
        }
    }

    pub fn failure(code: i64, message: &str) -> Self {
        Self {
            result: Value::Null,
            error: serde_json::json!({ "code": code, "message": message }),
            id: Value::from(1),
        }
    }

    /// Validate a decoded reply body. The body must be a JSON object carrying
    /// at least one of `result` or `error`.
    pub fn from_value(value: Value) -> Result<Self, BridgeError> {
        let Value::Object(mut obj) = value else {
            return Err(BridgeError::Protocol(
                "couldn't parse reply from server".into(),
            ));
        };
        if !obj.contains_key("result") && !obj.contains_key("error") {
            return Err(BridgeError::Protocol(
                "expected reply to have result, error and id properties".into(),
            ));
        }
        Ok(Self {
            result: obj.remove("result").unwrap_or(Value::Null),
            error: obj.remove("error").unwrap_or(Value::Null),
            id: obj.remove("id").unwrap_or(Value::Null),
        })
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_null()
    }

    /// The structured error as a [`BridgeError::Rpc`], if there is one.
    pub fn rpc_error(&self) -> Option<BridgeError> {
        if !self.is_error() {
            return None;
        }
        Some(BridgeError::Rpc {
            code: error_code_string(&self.error),
            message: error_message(&self.error).unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    pub code: String,
}

/// Reply sent back over the socket for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// `{"data": "...", "meta": {"status": 200}}`
    Success { data: String, meta: Meta },
    /// `{"errors": {"status": 400, "message": "...", "code": "..."}}`
    Failure { errors: ErrorBody },
}

impl ResponseEnvelope {
    pub fn success(data: impl Into<String>) -> Self {
        ResponseEnvelope::Success {
            data: data.into(),
            meta: Meta { status: STATUS_OK },
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        ResponseEnvelope::Failure {
            errors: ErrorBody {
                status: STATUS_ERROR,
                message: message.into(),
                code: code.into(),
            },
        }
    }

    /// Failure envelope for any [`BridgeError`], local or from the backend.
    pub fn from_error(err: &BridgeError) -> Self {
        Self::failure(err.code(), err.client_message())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    /// The `data` string of a success envelope.
    pub fn data(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Success { data, .. } => Some(data),
            ResponseEnvelope::Failure { .. } => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| FALLBACK_BODY.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Turn a backend reply into the client-facing envelope. Never fails.
pub fn normalize(reply: &RpcReply) -> ResponseEnvelope {
    if let Some(err) = reply.rpc_error() {
        return ResponseEnvelope::from_error(&err);
    }

    let data = match &reply.result {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    ResponseEnvelope::success(data)
}

fn error_code_string(error: &Value) -> String {
    match error.get("code") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn error_message(error: &Value) -> Option<String> {
    match error {
        Value::String(s) => Some(s.clone()),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
