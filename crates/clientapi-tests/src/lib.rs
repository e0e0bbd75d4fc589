//! Integration test helpers: a fake wallet backend, a ZeroMQ REQ client and
//! an in-process bridge.

pub mod harness;

use serde_json::Value;

/// `data` of a success envelope, or panic.
pub fn unwrap_data(resp: &Value) -> &str {
    match resp.get("data").and_then(Value::as_str) {
        Some(data) => data,
        None => panic!("expected success, got {resp}"),
    }
}

/// `(code, message)` of a failure envelope, or panic.
pub fn unwrap_error(resp: &Value) -> (String, Option<String>) {
    let Some(errors) = resp.get("errors") else {
        panic!("expected failure, got {resp}");
    };
    assert_eq!(errors["status"], Value::from(400), "bad status in {resp}");
    let code = errors["code"].as_str().unwrap_or_default().to_string();
    let message = errors.get("message").and_then(Value::as_str).map(str::to_string);
    (code, message)
}
