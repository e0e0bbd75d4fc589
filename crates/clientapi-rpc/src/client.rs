//! JSON-RPC 1.0 over HTTP client for the wallet node backend.

use crate::RpcBackend;
use crate::credentials::CredentialSource;
use clientapi::BridgeError;
use clientapi::response::RpcReply;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Default backend host.
pub const DEFAULT_RPC_CONNECT: &str = "127.0.0.1";

/// Default backend RPC port.
pub const DEFAULT_RPC_PORT: u16 = 8332;

/// Default per-call HTTP timeout.
pub const DEFAULT_HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(900);

/// Where and how to reach the backend.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub credentials: CredentialSource,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_CONNECT.to_string(),
            port: DEFAULT_RPC_PORT,
            timeout: DEFAULT_HTTP_CLIENT_TIMEOUT,
            credentials: CredentialSource::default(),
        }
    }
}

impl RpcConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

/// Issues one authenticated HTTP request per call, each on its own
/// connection.
#[derive(Debug, Clone)]
pub struct RpcClient {
    config: RpcConfig,
}

impl RpcClient {
    pub fn new(config: RpcConfig) -> Self {
        Self { config }
    }

    /// Execute `method` with `params` and return the parsed reply.
    ///
    /// A reply carrying a structured `error` is still `Ok`; only transport,
    /// authentication and framing problems are errors.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcReply, BridgeError> {
        let creds = self.config.credentials.resolve()?;

        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BridgeError::Protocol(format!("create http client failed: {e}")))?;

        let request = serde_json::json!({
            "method": method,
            "params": params,
            "id": 1,
        });

        tracing::debug!(method, url = %self.config.url(), "sending rpc request");

        let resp = client
            .post(self.config.url())
            .basic_auth(&creds.user, Some(&creds.password))
            .header(reqwest::header::CONNECTION, "close")
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BridgeError::Auth(
                "incorrect rpcuser or rpcpassword".into(),
            ));
        }
        if status.as_u16() >= 400
            && !matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::INTERNAL_SERVER_ERROR
            )
        {
            return Err(BridgeError::Protocol(format!(
                "server returned HTTP error {}",
                status.as_u16()
            )));
        }

        let body = resp.bytes().await.map_err(classify_transport_error)?;
        if body.is_empty() {
            return Err(BridgeError::Protocol("no response from server".into()));
        }

        let value: Value = serde_json::from_slice(&body)
            .map_err(|_| BridgeError::Protocol("couldn't parse reply from server".into()))?;
        let reply = RpcReply::from_value(value)?;

        tracing::debug!(method, status = status.as_u16(), error = reply.is_error(), "rpc reply");
        Ok(reply)
    }
}

impl RpcBackend for RpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcReply, BridgeError> {
        RpcClient::call(self, method, params).await
    }
}

/// Connection failures and timeouts are the recoverable kind; everything else
/// is a protocol failure. A timeout may fire after the backend has already
/// accepted the call, see [`crate::RetryPolicy`].
fn classify_transport_error(e: reqwest::Error) -> BridgeError {
    if e.is_connect() || e.is_timeout() {
        BridgeError::Connection(e.to_string())
    } else {
        BridgeError::Protocol(format!("send http request failed: {e}"))
    }
}
