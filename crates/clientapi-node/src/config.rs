//! Daemon configuration: command line, then `clientapi.toml`, then defaults.

use anyhow::{Context, Result};
use clap::Parser;
use clientapi::DEFAULT_ENDPOINT;
use clientapi_rpc::credentials::CredentialSource;
use clientapi_rpc::{RetryPolicy, RpcConfig};
use clientapi_store::data_dir::{DATA_DIR_ENV, default_data_dir};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "clientapi.toml";

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "ZeroMQ to wallet JSON-RPC bridge")]
pub struct Args {
    /// ZeroMQ endpoint to bind (default: tcp://*:5557).
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Data directory holding the cookie file and persistent documents.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Backend RPC host.
    #[arg(long)]
    pub rpc_connect: Option<String>,

    /// Backend RPC port.
    #[arg(long)]
    pub rpc_port: Option<u16>,

    #[arg(long)]
    pub rpc_user: Option<String>,

    #[arg(long)]
    pub rpc_password: Option<String>,

    /// Per-call HTTP timeout in seconds.
    #[arg(long)]
    pub rpc_timeout: Option<u64>,

    /// Keep retrying while the backend is unreachable.
    #[arg(long)]
    pub rpc_wait: bool,

    /// Config file (default: <data-dir>/clientapi.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Keys accepted in `clientapi.toml`.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub rpc_connect: Option<String>,
    pub rpc_port: Option<u16>,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    pub rpc_timeout: Option<u64>,
    pub rpc_wait: Option<bool>,
}

impl FileConfig {
    /// Parse `path`. A missing file is an empty config unless `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        toml::from_str(&contents).with_context(|| format!("invalid {}", path.display()))
    }
}

/// Environment values consulted after the command line.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub endpoint: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("CLIENTAPI_ENDPOINT").ok(),
            data_dir: std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
        }
    }
}

/// Fully resolved daemon settings.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub endpoint: String,
    pub data_dir: PathBuf,
    pub rpc: RpcConfig,
    pub retry: RetryPolicy,
}

impl BridgeConfig {
    /// Resolve against the process environment and the config file on disk.
    pub fn resolve(args: Args) -> Result<Self> {
        Self::resolve_with(args, &EnvOverrides::from_env())
    }

    pub fn resolve_with(args: Args, env: &EnvOverrides) -> Result<Self> {
        let cli_data_dir = args.data_dir.clone().or_else(|| env.data_dir.clone());

        let file = match (&args.config, &cli_data_dir) {
            (Some(path), _) => FileConfig::load(path, true)?,
            (None, Some(dir)) => FileConfig::load(&dir.join(CONFIG_FILE), false)?,
            (None, None) => match home_data_dir() {
                Some(dir) => FileConfig::load(&dir.join(CONFIG_FILE), false)?,
                None => FileConfig::default(),
            },
        };

        Self::merge(args, file, env)
    }

    /// Layer `args` over `env` over `file` over built-in defaults.
    pub fn merge(args: Args, file: FileConfig, env: &EnvOverrides) -> Result<Self> {
        let data_dir = match args
            .data_dir
            .or_else(|| env.data_dir.clone())
            .or(file.data_dir)
        {
            Some(dir) => dir,
            None => home_data_dir().context("no data directory: set --data-dir or HOME")?,
        };

        let endpoint = args
            .endpoint
            .or_else(|| env.endpoint.clone())
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let defaults = RpcConfig::default();
        let rpc = RpcConfig {
            host: args.rpc_connect.or(file.rpc_connect).unwrap_or(defaults.host),
            port: args.rpc_port.or(file.rpc_port).unwrap_or(defaults.port),
            timeout: args
                .rpc_timeout
                .or(file.rpc_timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            credentials: CredentialSource {
                rpc_user: args.rpc_user.or(file.rpc_user).unwrap_or_default(),
                rpc_password: args.rpc_password.or(file.rpc_password).unwrap_or_default(),
                cookie_dir: Some(data_dir.clone()),
            },
        };

        let wait = args.rpc_wait || file.rpc_wait.unwrap_or(false);
        let retry = RetryPolicy {
            wait_for_backend: wait,
            ..RetryPolicy::default()
        };

        Ok(Self {
            endpoint,
            data_dir,
            rpc,
            retry,
        })
    }
}

fn home_data_dir() -> Option<PathBuf> {
    default_data_dir().ok()
}
