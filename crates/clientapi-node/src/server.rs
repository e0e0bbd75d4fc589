use crate::dispatch::Dispatcher;
use anyhow::{Context, Result, anyhow};
use clientapi_rpc::RpcBackend;
use tmq::request_reply::RequestReceiver;
use tmq::{FromZmqSocket, Multipart};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Upper bound on how long a closing socket keeps flushing an unsent reply.
const REPLY_LINGER_MS: i32 = 1000;

/// A bound REP socket plus the dispatcher that answers it.
pub struct BridgeServer<B> {
    // Kept alive for as long as the socket is.
    _context: zmq::Context,
    endpoint: String,
    receiver: RequestReceiver,
    dispatcher: Dispatcher<B>,
    shutdown: CancellationToken,
}

impl<B: RpcBackend + 'static> BridgeServer<B> {
    /// Create the REP socket and bind it to `endpoint`.
    ///
    /// Wildcard endpoints such as `tcp://127.0.0.1:*` are resolved, see
    /// [`BridgeServer::endpoint`].
    pub fn bind(endpoint: &str, dispatcher: Dispatcher<B>) -> Result<Self> {
        let context = zmq::Context::new();
        let socket = context
            .socket(zmq::REP)
            .context("failed to create REP socket")?;
        socket
            .set_linger(REPLY_LINGER_MS)
            .context("failed to set linger")?;
        socket
            .bind(endpoint)
            .with_context(|| format!("failed to bind {endpoint}"))?;

        let bound = socket
            .get_last_endpoint()
            .ok()
            .and_then(|e| e.ok())
            .unwrap_or_else(|| endpoint.to_string());

        let receiver = RequestReceiver::from_zmq_socket(socket)
            .map_err(|e| anyhow!("failed to wrap REP socket: {e}"))?;

        tracing::info!(endpoint = %bound, "bridge listening");
        Ok(Self {
            _context: context,
            endpoint: bound,
            receiver,
            dispatcher,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Spawn the worker loop.
    pub fn start(self) -> ServerHandle {
        let shutdown = self.shutdown.clone();
        let endpoint = self.endpoint.clone();
        let task = tokio::spawn(async move {
            let result = self.run().await;
            match &result {
                Ok(()) => tracing::info!(endpoint = %endpoint, "bridge stopped"),
                Err(e) => tracing::error!(endpoint = %endpoint, err = %e, "bridge failed"),
            }
            result
        });
        ServerHandle {
            task: Some(task),
            shutdown,
        }
    }

    /// Receive, dispatch, reply; one request at a time until shutdown.
    async fn run(self) -> Result<()> {
        let Self {
            _context,
            mut receiver,
            dispatcher,
            shutdown,
            ..
        } = self;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    tracing::debug!("shutdown requested");
                    break;
                }

                result = receiver.recv() => {
                    let (msg, sender) = result.context("receive failed")?;
                    let body: Vec<u8> = msg
                        .into_iter()
                        .flat_map(|frame| frame.to_vec())
                        .collect();
                    tracing::trace!(bytes = body.len(), "request received");

                    let response = dispatcher.handle(&body, &shutdown).await;

                    let reply: Multipart = vec![response.to_bytes()].into();
                    receiver = sender.send(reply).await.context("send failed")?;
                }
            }
        }

        Ok(())
    }
}

/// Controls a running [`BridgeServer`].
pub struct ServerHandle {
    task: Option<JoinHandle<Result<()>>>,
    shutdown: CancellationToken,
}

impl ServerHandle {
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Request shutdown and wait for the worker to exit. Safe to call twice.
    pub async fn stop(&mut self) -> Result<()> {
        self.shutdown.cancel();
        self.wait().await
    }

    /// Wait for the worker to exit on its own.
    ///
    /// Cancel safe: dropping the future leaves the handle able to `stop()`.
    pub async fn wait(&mut self) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let joined = task.await;
        self.task = None;
        joined.context("bridge task panicked")?
    }
}
