//! Mount-table probe
//!
//! Asks the OS whether a path is an active mount point by running
//! `mountpoint -q`. The result is deliberately three-valued: an inconclusive
//! probe (tool missing, permission error, timeout) is `Unknown`, which action
//! routing treats as not-mounted. False negatives lead to a retried mount the
//! OS rejects; false positives would block legitimate mounts, so we fail
//! open.

use std::path::Path;
use std::time::Duration;

use crate::mount::runner::run_command;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Point-in-time observation of a mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    Mounted,
    NotMounted,
    /// Probe inconclusive; treated as not-mounted for action routing.
    Unknown,
}

/// Queries the OS mount table for a given path.
#[derive(Debug, Clone)]
pub struct MountProbe {
    command: String,
    timeout: Duration,
}

impl Default for MountProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MountProbe {
    pub fn new() -> Self {
        Self {
            command: "mountpoint".to_string(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the probe tool (tests point this at a mock script).
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe whether `path` is an active mount point.
    pub fn probe(&self, path: &Path) -> ProbeResult {
        let args = vec!["-q".to_string(), path.to_string_lossy().into_owned()];
        match run_command(&self.command, &args, self.timeout) {
            Ok(output) if output.timed_out => {
                tracing::warn!("Mount probe timed out for {:?}", path);
                ProbeResult::Unknown
            }
            Ok(output) if output.status == 0 => ProbeResult::Mounted,
            Ok(_) => ProbeResult::NotMounted,
            Err(e) => {
                tracing::warn!("Mount probe failed for {:?}: {}", path, e);
                ProbeResult::Unknown
            }
        }
    }

    /// Fail-open boolean view: only a confirmed `Mounted` counts.
    pub fn is_mounted(&self, path: &Path) -> bool {
        self.probe(path) == ProbeResult::Mounted
    }
}

/// Check whether a tool is available on the system path.
///
/// Absence is reported to the user once at startup but never prevents the
/// application from running; operations fail later with a clear error.
pub fn tool_on_path(name: &str) -> bool {
    run_command(
        "which",
        &[name.to_string()],
        Duration::from_secs(5),
    )
    .map(|output| output.success())
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_missing_tool_is_unknown() {
        let probe = MountProbe::new().with_command("definitely-not-a-real-tool-xyz");
        assert_eq!(probe.probe(Path::new("/tmp")), ProbeResult::Unknown);
        // Fail-open: unknown maps to "not mounted".
        assert!(!probe.is_mounted(Path::new("/tmp")));
    }

    #[test]
    #[cfg(unix)]
    fn test_probe_exit_codes() {
        // `true` ignores its arguments and exits 0, `false` exits 1.
        let mounted = MountProbe::new().with_command("true");
        assert_eq!(mounted.probe(Path::new("/tmp")), ProbeResult::Mounted);

        let not_mounted = MountProbe::new().with_command("false");
        assert_eq!(not_mounted.probe(Path::new("/tmp")), ProbeResult::NotMounted);
    }

    #[test]
    #[cfg(unix)]
    fn test_tool_on_path() {
        assert!(tool_on_path("sh"));
        assert!(!tool_on_path("definitely-not-a-real-tool-xyz"));
    }
}
