use super::REPLY_TIMEOUT;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use tmq::request_reply::RequestSender;
use tmq::{FromZmqSocket, Multipart};

/// ZeroMQ REQ peer talking to a bridge.
pub struct TestClient {
    _context: zmq::Context,
    sender: Option<RequestSender>,
}

impl TestClient {
    pub fn connect(endpoint: &str) -> Result<Self> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::REQ)?;
        socket.set_linger(0)?;
        socket
            .connect(endpoint)
            .with_context(|| format!("failed to connect to {endpoint}"))?;
        let sender = RequestSender::from_zmq_socket(socket)?;
        Ok(Self {
            _context: context,
            sender: Some(sender),
        })
    }

    /// Send `{"type": command, "payload": payload}` and parse the envelope.
    pub async fn request(&mut self, command: &str, payload: Value) -> Result<Value> {
        let body = json!({"type": command, "payload": payload}).to_string();
        self.send_raw(body.as_bytes()).await
    }

    pub async fn send_raw(&mut self, body: &[u8]) -> Result<Value> {
        self.send_frames(&[body]).await
    }

    /// Send one request split over several frames.
    pub async fn send_frames(&mut self, frames: &[&[u8]]) -> Result<Value> {
        let sender = self
            .sender
            .take()
            .context("previous request never got a reply")?;
        let msg: Multipart = frames
            .iter()
            .map(|f| f.to_vec())
            .collect::<Vec<_>>()
            .into();
        let receiver = sender.send(msg).await?;

        let (reply, sender) = tokio::time::timeout(REPLY_TIMEOUT, receiver.recv())
            .await
            .context("timed out waiting for reply")??;
        self.sender = Some(sender);

        let bytes: Vec<u8> = reply.into_iter().flat_map(|f| f.to_vec()).collect();
        serde_json::from_slice(&bytes).context("reply is not JSON")
    }
}
