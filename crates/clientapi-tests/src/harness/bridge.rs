use super::client::TestClient;
use anyhow::Result;
use clientapi_node::{BridgeServer, Dispatcher, ServerHandle};
use clientapi_rpc::{RetryPolicy, RpcClient, RpcConfig};
use clientapi_store::PaymentRequestStore;
use std::path::Path;
use tempfile::TempDir;

/// A bridge running in-process on an ephemeral loopback port.
pub struct TestBridge {
    pub endpoint: String,
    pub handle: ServerHandle,
    data_dir: TempDir,
}

impl TestBridge {
    pub async fn spawn(rpc: RpcConfig) -> Result<Self> {
        Self::spawn_with_retry(rpc, RetryPolicy::default()).await
    }

    pub async fn spawn_with_retry(rpc: RpcConfig, retry: RetryPolicy) -> Result<Self> {
        super::init_tracing();
        let data_dir = TempDir::new()?;
        let store = PaymentRequestStore::open(data_dir.path());
        let dispatcher = Dispatcher::new(RpcClient::new(rpc), store, retry);

        let server = BridgeServer::bind("tcp://127.0.0.1:*", dispatcher)?;
        let endpoint = server.endpoint().to_string();
        let handle = server.start();

        Ok(Self {
            endpoint,
            handle,
            data_dir,
        })
    }

    pub fn client(&self) -> Result<TestClient> {
        TestClient::connect(&self.endpoint)
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// A second handle onto the bridge's payment request document.
    pub fn store(&self) -> PaymentRequestStore {
        PaymentRequestStore::open(self.data_dir.path())
    }
}
