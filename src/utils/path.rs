//! Home-directory shorthand expansion.
//!
//! Connection definitions store mount points and key paths as the user typed
//! them (e.g. `~/mnt/server`). Expansion happens at the point of use so the
//! persisted config stays portable between machines.

use std::path::PathBuf;

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// Paths without the shorthand are returned unchanged. If the home directory
/// cannot be determined the shorthand is left as-is; the downstream tool will
/// produce the authoritative error.
pub fn expand_home(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}
