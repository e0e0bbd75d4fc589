pub mod payment_request;

use clientapi::request::{DecodedRequest, decode};
use clientapi::response::{ResponseEnvelope, RpcReply, normalize};
use clientapi::{BridgeError, PAYMENT_REQUEST_COMMAND};
use clientapi_rpc::retry::call_with_retry;
use clientapi_rpc::{ConvertTable, RetryPolicy, RpcBackend};
use clientapi_store::PaymentRequestStore;
use serde_json::Value;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Multi-step commands implemented by the bridge itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeCommand {
    /// New address from the backend, recorded in the payment request store.
    PaymentRequest,
}

/// How a command is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandHandler {
    /// Forward to the backend method of the same name.
    PassThrough,
    Composite(CompositeCommand),
}

/// Command name → handler. Names without an entry are passed through.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    /// Registry with every composite command the bridge ships.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        registry.register(
            PAYMENT_REQUEST_COMMAND,
            CommandHandler::Composite(CompositeCommand::PaymentRequest),
        );
        registry
    }

    pub fn register(&mut self, command: &str, handler: CommandHandler) {
        self.handlers.insert(command.to_string(), handler);
    }

    pub fn resolve(&self, command: &str) -> CommandHandler {
        self.handlers
            .get(command)
            .copied()
            .unwrap_or(CommandHandler::PassThrough)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Turns one raw request body into exactly one response envelope.
pub struct Dispatcher<B> {
    backend: B,
    convert: ConvertTable,
    registry: CommandRegistry,
    retry: RetryPolicy,
    store: PaymentRequestStore,
}

impl<B: RpcBackend> Dispatcher<B> {
    pub fn new(backend: B, store: PaymentRequestStore, retry: RetryPolicy) -> Self {
        Self {
            backend,
            convert: ConvertTable::standard(),
            registry: CommandRegistry::standard(),
            retry,
            store,
        }
    }

    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &PaymentRequestStore {
        &self.store
    }

    /// Handle one request. Every failure is folded into a failure envelope.
    pub async fn handle(&self, body: &[u8], shutdown: &CancellationToken) -> ResponseEnvelope {
        match self.try_handle(body, shutdown).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(code = %e.code(), err = %e, "request failed");
                ResponseEnvelope::from_error(&e)
            }
        }
    }

    async fn try_handle(
        &self,
        body: &[u8],
        shutdown: &CancellationToken,
    ) -> Result<ResponseEnvelope, BridgeError> {
        let request = decode(body)?;
        let handler = self.registry.resolve(&request.command);
        tracing::debug!(
            command = %request.command,
            args = request.args.len(),
            ?handler,
            "dispatching request"
        );

        match handler {
            CommandHandler::PassThrough => self.pass_through(&request, shutdown).await,
            CommandHandler::Composite(CompositeCommand::PaymentRequest) => {
                payment_request::handle_payment_request(self, &request, shutdown).await
            }
        }
    }

    async fn pass_through(
        &self,
        request: &DecodedRequest,
        shutdown: &CancellationToken,
    ) -> Result<ResponseEnvelope, BridgeError> {
        let params = self.convert.convert_all(&request.command, &request.args)?;
        let reply = self.call(&request.command, params, shutdown).await?;
        Ok(normalize(&reply))
    }

    /// One backend call under the configured retry policy.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
        shutdown: &CancellationToken,
    ) -> Result<RpcReply, BridgeError> {
        call_with_retry(&self.backend, self.retry, shutdown, method, params).await
    }
}

#[cfg(test)]
mod tests;
