//! Layout of the bridge's data directory.
//!
//! The directory is shared with the wallet node, which drops its `.cookie`
//! there. Everything the bridge itself writes goes under `persistent/` so it
//! never collides with node-owned files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Overrides the data directory location.
pub const DATA_DIR_ENV: &str = "CLIENTAPI_DATA_DIR";

/// Fallback location, relative to `$HOME`.
const HOME_DATA_DIR: &str = ".local/state/clientapi";

/// Subdirectory holding bridge-owned documents.
pub const PERSISTENT_DIR: &str = "persistent";

/// `$CLIENTAPI_DATA_DIR`, else `~/.local/state/clientapi`.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var_os("HOME")
        .context("cannot locate the data directory: HOME is not set")?;
    Ok(PathBuf::from(home).join(HOME_DATA_DIR))
}

/// Create `path` and its parents when missing.
///
/// Payment requests are private to the operator, so a directory created here
/// is owner-only. An existing directory keeps its permissions.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("cannot create data directory {}", path.display()))?;
    #[cfg(unix)]
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .with_context(|| format!("cannot restrict permissions on {}", path.display()))?;
    Ok(())
}

/// Where bridge-owned documents live inside `data_dir`.
pub fn persistent_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(PERSISTENT_DIR)
}
