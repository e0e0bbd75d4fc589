//! axum server standing in for the wallet node's JSON-RPC port.

use anyhow::Result;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use clientapi_rpc::RpcConfig;
use clientapi_rpc::credentials::CredentialSource;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const RPC_USER: &str = "rpcuser";
pub const RPC_PASSWORD: &str = "rpcpass";

/// HTTP status and raw body sent back for one call.
#[derive(Debug, Clone)]
pub struct CannedReply {
    pub status: u16,
    pub body: String,
    /// Sent as `Location` when set.
    pub location: Option<String>,
    /// Held back this long after the request is recorded.
    pub delay: Option<Duration>,
}

impl CannedReply {
    pub fn result(result: Value) -> Self {
        Self::raw(
            200,
            &json!({"result": result, "error": null, "id": 1}).to_string(),
        )
    }

    /// Application error the way the node reports it: HTTP 500 with a JSON body.
    pub fn error(code: i64, message: &str) -> Self {
        let body = json!({
            "result": null,
            "error": {"code": code, "message": message},
            "id": 1,
        });
        Self::raw(500, &body.to_string())
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            location: None,
            delay: None,
        }
    }

    /// Temporary redirect with an empty body.
    pub fn redirect(location: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            ..Self::raw(307, "")
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub peer: SocketAddr,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn method(&self) -> &str {
        self.body["method"].as_str().unwrap_or_default()
    }

    pub fn params(&self) -> &Value {
        &self.body["params"]
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct BackendState {
    replies: Mutex<HashMap<String, CannedReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Answers each JSON-RPC method with a scripted reply. Unscripted methods get
/// the node's "Method not found" error.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    task: JoinHandle<()>,
}

impl FakeBackend {
    pub async fn spawn() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(BackendState::default());

        // Every path lands in the same handler so a followed redirect would
        // show up in `requests()`.
        let app = Router::new()
            .route("/", post(handle_rpc))
            .fallback(handle_rpc)
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::debug!(err = %e, "fake backend stopped");
            }
        });

        Ok(Self { addr, state, task })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Client config pointing at this backend with password credentials.
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            timeout: Duration::from_secs(5),
            credentials: CredentialSource {
                rpc_user: RPC_USER.to_string(),
                rpc_password: RPC_PASSWORD.to_string(),
                cookie_dir: None,
            },
        }
    }

    pub fn reply(&self, method: &str, reply: CannedReply) {
        self.state
            .replies
            .lock()
            .unwrap()
            .insert(method.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle_rpc(
    State(state): State<Arc<BackendState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let request = RecordedRequest {
        path: uri.path().to_string(),
        peer,
        headers: headers
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), value)
            })
            .collect(),
        body,
    };

    let reply = state
        .replies
        .lock()
        .unwrap()
        .get(request.method())
        .cloned()
        .unwrap_or_else(|| CannedReply::error(-32601, "Method not found"));
    state.requests.lock().unwrap().push(request);

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut out = HeaderMap::new();
    out.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Some(value) = reply
        .location
        .as_deref()
        .and_then(|location| HeaderValue::from_str(location).ok())
    {
        out.insert(header::LOCATION, value);
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, out, reply.body)
}
