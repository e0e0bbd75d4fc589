use clientapi::BridgeError;
use std::path::{Path, PathBuf};

/// Name of the cookie file the backend writes into its data directory.
pub const COOKIE_FILE: &str = ".cookie";

/// HTTP Basic credentials for the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Parse a `user:password` line as written to the cookie file.
    pub fn parse_user_colon_pass(line: &str) -> Option<Self> {
        let (user, password) = line.trim_end_matches(['\r', '\n']).split_once(':')?;
        Some(Self::new(user, password))
    }
}

/// Where credentials come from.
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    pub rpc_user: String,
    pub rpc_password: String,
    /// Directory holding the backend's cookie file.
    pub cookie_dir: Option<PathBuf>,
}

impl CredentialSource {
    /// Resolve credentials: a configured password wins, otherwise the cookie
    /// file is read.
    pub fn resolve(&self) -> Result<Credentials, BridgeError> {
        if !self.rpc_password.is_empty() {
            return Ok(Credentials::new(&self.rpc_user, &self.rpc_password));
        }
        if let Some(dir) = &self.cookie_dir
            && let Some(creds) = read_cookie(dir)
        {
            return Ok(creds);
        }
        Err(BridgeError::Auth(
            "could not locate RPC credentials: no authentication cookie could be found, \
             and no rpcpassword is set"
                .into(),
        ))
    }
}

/// Read `<dir>/.cookie`, returning `None` when it is missing or unreadable.
pub fn read_cookie(dir: &Path) -> Option<Credentials> {
    let path = dir.join(COOKIE_FILE);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let creds = contents.lines().next().and_then(Credentials::parse_user_colon_pass);
            if creds.is_none() {
                tracing::warn!(path = %path.display(), "malformed cookie file");
            }
            creds
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), err = %e, "no cookie file");
            None
        }
    }
}
