use crate::RpcBackend;
use clientapi::BridgeError;
use clientapi::response::RpcReply;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed pause between attempts while waiting for the backend.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Whether to keep retrying calls that fail to connect.
///
/// Timeouts count as connection failures. A call that timed out may still
/// have been executed by the backend, so in wait mode a non-idempotent method
/// such as `sendtoaddress` can run twice. Keep `RpcConfig::timeout` well
/// above the backend's worst-case latency when enabling `wait_for_backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry connection failures without bound instead of surfacing them.
    pub wait_for_backend: bool,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            wait_for_backend: false,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RetryPolicy {
    pub fn wait(interval: Duration) -> Self {
        Self {
            wait_for_backend: true,
            interval,
        }
    }
}

/// Call the backend, retrying recoverable failures per `policy`.
///
/// Cancelling `cancel` stops the retry loop and returns the last connection
/// error, so the request in flight still gets a reply.
pub async fn call_with_retry<B: RpcBackend>(
    backend: &B,
    policy: RetryPolicy,
    cancel: &CancellationToken,
    method: &str,
    params: Vec<Value>,
) -> Result<RpcReply, BridgeError> {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match backend.call(method, params.clone()).await {
            Err(e) if e.is_recoverable() && policy.wait_for_backend => {
                tracing::info!(method, attempt, err = %e, "backend unavailable, retrying");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!(method, "retry abandoned on shutdown");
                        return Err(e);
                    }
                    _ = tokio::time::sleep(policy.interval) => {}
                }
            }
            other => return other,
        }
    }
}
