pub mod client;
pub mod convert;
pub mod credentials;
pub mod retry;

use clientapi::BridgeError;
use clientapi::response::RpcReply;
use serde_json::Value;
use std::future::Future;

pub use client::{RpcClient, RpcConfig};
pub use convert::ConvertTable;
pub use retry::RetryPolicy;

/// Something that can execute one JSON-RPC call against the backend.
///
/// [`RpcClient`] is the real implementation; tests plug in scripted backends.
pub trait RpcBackend: Send + Sync {
    fn call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<RpcReply, BridgeError>> + Send;
}
