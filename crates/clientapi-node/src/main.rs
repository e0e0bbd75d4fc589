use anyhow::{Context, Result};
use clap::Parser;
use clientapi_node::config::{Args, BridgeConfig};
use clientapi_node::{BridgeServer, Dispatcher};
use clientapi_rpc::RpcClient;
use clientapi_store::PaymentRequestStore;
use clientapi_store::data_dir::ensure_dir;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clientapi_node=info,clientapi_rpc=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = BridgeConfig::resolve(args).context("failed to load configuration")?;
    ensure_dir(&config.data_dir)?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        backend = %config.rpc.url(),
        wait = config.retry.wait_for_backend,
        "starting clientapi bridge"
    );

    let store = PaymentRequestStore::open(&config.data_dir);
    let backend = RpcClient::new(config.rpc.clone());
    let dispatcher = Dispatcher::new(backend, store, config.retry);

    let server = BridgeServer::bind(&config.endpoint, dispatcher)?;
    let mut handle = server.start();

    // Run until SIGINT or until the worker dies on its own.
    tokio::select! {
        result = handle.wait() => {
            result.context("bridge server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
    }

    handle.stop().await?;
    tracing::info!("clientapi-node shut down");
    Ok(())
}
