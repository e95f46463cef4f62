//! Connections file persistence
//!
//! Plain JSON serialize/deserialize boundary for the connection list. The
//! location is passed in at startup rather than read from process-wide state,
//! so tests and the `--config` flag can point it anywhere.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::connections::definition::ConnectionDefinition;

/// Handle on the JSON file holding the ordered connection list.
#[derive(Debug, Clone)]
pub struct ConnectionsFile {
    path: PathBuf,
}

impl ConnectionsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Default location under the user config directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("sshfs-manager");
        Ok(Self::new(dir.join("connections.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all definitions. A missing file is an empty list, not an error.
    ///
    /// A parse failure is an error; the caller reports it and starts with an
    /// empty store rather than a partially populated one.
    pub fn load(&self) -> Result<Vec<ConnectionDefinition>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read connections file: {:?}", self.path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse connections file: {:?}", self.path))
    }

    /// Write all definitions, creating parent directories as needed.
    pub fn save(&self, defs: &[ConnectionDefinition]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let content =
            serde_json::to_string_pretty(defs).context("Failed to serialize connections")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write connections file: {:?}", self.path))?;
        Ok(())
    }
}
