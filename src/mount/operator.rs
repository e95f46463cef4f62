//! Mount and unmount state machine
//!
//! Builds sshfs/fusermount/umount command lines from a connection definition
//! and drives the runner and probe through a single attempt with pre/post
//! checks. Attempts never raise past this boundary: every path returns an
//! [`OperationOutcome`] with a success flag, a human-readable message and a
//! machine-checkable classification.
//!
//! At most one mount/unmount action runs per mount point at a time. Each path
//! has an exclusive lock acquired before the probe-then-act sequence and held
//! through the subprocess timeout window; the guard releases on every exit
//! path by scope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::connections::ConnectionDefinition;
use crate::mount::probe::{MountProbe, ProbeResult};
use crate::mount::runner::run_command;

const DEFAULT_MOUNT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_UNMOUNT_TIMEOUT: Duration = Duration::from_secs(10);

/// External tool names, injectable for tests.
#[derive(Debug, Clone)]
pub struct Tools {
    pub sshfs: String,
    pub fusermount: String,
    pub umount: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            sshfs: "sshfs".to_string(),
            fusermount: "fusermount".to_string(),
            umount: "umount".to_string(),
        }
    }
}

/// Classification of how an attempt ended.
///
/// `TimedOut` is kept distinct from `ToolFailed` so callers can re-probe
/// before trusting any state change; both report as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Mounted,
    AlreadyMounted,
    MountPointCreationFailed,
    ToolFailed,
    TimedOut,
    Unmounted,
    AlreadyUnmounted,
    InvalidDefinition,
}

/// Result of one mount or unmount attempt.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub success: bool,
    /// Human-readable diagnostic, shown verbatim, never parsed.
    pub message: String,
    pub kind: OutcomeKind,
}

impl OperationOutcome {
    fn ok(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind,
        }
    }

    fn fail(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind,
        }
    }
}

/// Executes mount/unmount attempts for connection definitions.
pub struct MountOperator {
    tools: Tools,
    probe: MountProbe,
    mount_timeout: Duration,
    unmount_timeout: Duration,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Default for MountOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl MountOperator {
    pub fn new() -> Self {
        Self {
            tools: Tools::default(),
            probe: MountProbe::new(),
            mount_timeout: DEFAULT_MOUNT_TIMEOUT,
            unmount_timeout: DEFAULT_UNMOUNT_TIMEOUT,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tools(mut self, tools: Tools) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_probe(mut self, probe: MountProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_mount_timeout(mut self, timeout: Duration) -> Self {
        self.mount_timeout = timeout;
        self
    }

    pub fn with_unmount_timeout(mut self, timeout: Duration) -> Self {
        self.unmount_timeout = timeout;
        self
    }

    pub fn probe(&self) -> &MountProbe {
        &self.probe
    }

    /// Exclusive lock for a mount point path, shared across all callers.
    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn hold<'a>(lock: &'a Mutex<()>) -> MutexGuard<'a, ()> {
        match lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Attempt to mount a connection.
    pub fn mount(&self, def: &ConnectionDefinition) -> OperationOutcome {
        if let Err(e) = def.validate() {
            return OperationOutcome::fail(OutcomeKind::InvalidDefinition, e.to_string());
        }

        let mount_point = def.mount_point();
        let lock = self.lock_for(&mount_point);
        let _guard = Self::hold(&lock);

        if let Err(e) = std::fs::create_dir_all(&mount_point) {
            return OperationOutcome::fail(
                OutcomeKind::MountPointCreationFailed,
                format!("Failed to create mount point: {}", e),
            );
        }

        // Not the same as success: whatever occupies the path may not be this
        // definition's filesystem.
        if self.probe.probe(&mount_point) == ProbeResult::Mounted {
            return OperationOutcome::fail(
                OutcomeKind::AlreadyMounted,
                "Mount point is already in use",
            );
        }

        let args = self.build_mount_args(def, &mount_point);
        tracing::debug!("Mounting {}: {} {:?}", def.name, self.tools.sshfs, args);

        match run_command(&self.tools.sshfs, &args, self.mount_timeout) {
            Ok(output) if output.timed_out => OperationOutcome::fail(
                OutcomeKind::TimedOut,
                format!(
                    "Mount operation timed out ({}s)",
                    self.mount_timeout.as_secs()
                ),
            ),
            Ok(output) if output.success() => {
                OperationOutcome::ok(OutcomeKind::Mounted, "Successfully mounted")
            }
            Ok(output) => OperationOutcome::fail(
                OutcomeKind::ToolFailed,
                format!("Mount failed: {}", output.diagnostic()),
            ),
            Err(e) => {
                OperationOutcome::fail(OutcomeKind::ToolFailed, format!("Mount failed: {}", e))
            }
        }
    }

    /// Attempt to unmount a connection. Idempotent: an already-unmounted
    /// target short-circuits to success.
    pub fn unmount(&self, def: &ConnectionDefinition) -> OperationOutcome {
        let mount_point = def.mount_point();
        let lock = self.lock_for(&mount_point);
        let _guard = Self::hold(&lock);

        if self.probe.probe(&mount_point) != ProbeResult::Mounted {
            return OperationOutcome::ok(OutcomeKind::AlreadyUnmounted, "Not mounted");
        }

        let path_arg = mount_point.to_string_lossy().into_owned();

        // FUSE-aware tool first.
        let fusermount_args = vec!["-u".to_string(), path_arg.clone()];
        match run_command(&self.tools.fusermount, &fusermount_args, self.unmount_timeout) {
            Ok(output) if output.timed_out => {
                return OperationOutcome::fail(
                    OutcomeKind::TimedOut,
                    "Unmount operation timed out",
                );
            }
            Ok(output) if output.success() => {
                return OperationOutcome::ok(OutcomeKind::Unmounted, "Successfully unmounted");
            }
            // Non-zero exit or missing tool: fall through to the generic
            // unmount. The first diagnostic is dropped; only the fallback's
            // error is surfaced.
            Ok(_) | Err(_) => {}
        }

        let umount_args = vec![path_arg];
        match run_command(&self.tools.umount, &umount_args, self.unmount_timeout) {
            Ok(output) if output.timed_out => {
                OperationOutcome::fail(OutcomeKind::TimedOut, "Unmount operation timed out")
            }
            Ok(output) if output.success() => {
                OperationOutcome::ok(OutcomeKind::Unmounted, "Successfully unmounted")
            }
            Ok(output) => OperationOutcome::fail(
                OutcomeKind::ToolFailed,
                format!("Unmount failed: {}", output.diagnostic()),
            ),
            Err(e) => {
                OperationOutcome::fail(OutcomeKind::ToolFailed, format!("Unmount failed: {}", e))
            }
        }
    }

    /// Build the sshfs argument list for a definition.
    ///
    /// `sshfs user@host:remote_path mount_point -p PORT [-o IdentityFile=KEY]
    /// [extra...]`. A configured identity file that does not exist on disk is
    /// silently omitted so password auth still gets a chance.
    fn build_mount_args(&self, def: &ConnectionDefinition, mount_point: &Path) -> Vec<String> {
        let mut args = vec![
            def.remote_target(),
            mount_point.to_string_lossy().into_owned(),
            "-p".to_string(),
            def.port.to_string(),
        ];

        if let Some(key) = def.identity_file() {
            if key.exists() {
                args.push("-o".to_string());
                args.push(format!("IdentityFile={}", key.display()));
            } else {
                tracing::debug!(
                    "Identity file {:?} for {} does not exist; omitting",
                    key,
                    def.name
                );
            }
        }

        args.extend(def.extra_args());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConnectionDefinition {
        ConnectionDefinition {
            name: "home".to_string(),
            host: "h.example.com".to_string(),
            port: 22,
            username: "alice".to_string(),
            remote_path: "/home/alice".to_string(),
            local_mount_point: "/mnt/home".to_string(),
            ssh_key: String::new(),
            extra_options: String::new(),
        }
    }

    #[test]
    fn test_build_mount_args_basic() {
        let operator = MountOperator::new();
        let def = sample();
        let args = operator.build_mount_args(&def, Path::new("/mnt/home"));
        assert_eq!(
            args,
            vec!["alice@h.example.com:/home/alice", "/mnt/home", "-p", "22"]
        );
    }

    #[test]
    fn test_build_mount_args_missing_identity_file_omitted() {
        let operator = MountOperator::new();
        let mut def = sample();
        def.ssh_key = "/nonexistent/path/id_rsa".to_string();
        let args = operator.build_mount_args(&def, Path::new("/mnt/home"));
        assert!(!args.iter().any(|a| a.contains("IdentityFile")));
    }

    #[test]
    fn test_build_mount_args_existing_identity_file_bound() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("id_ed25519");
        std::fs::write(&key, "key material").unwrap();

        let operator = MountOperator::new();
        let mut def = sample();
        def.ssh_key = key.to_string_lossy().into_owned();
        let args = operator.build_mount_args(&def, Path::new("/mnt/home"));

        let idx = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[idx + 1], format!("IdentityFile={}", key.display()));
    }

    #[test]
    fn test_build_mount_args_extra_options_appended_verbatim() {
        let operator = MountOperator::new();
        let mut def = sample();
        def.extra_options = "-o reconnect,ServerAliveInterval=15".to_string();
        let args = operator.build_mount_args(&def, Path::new("/mnt/home"));
        assert_eq!(
            &args[4..],
            &["-o".to_string(), "reconnect,ServerAliveInterval=15".to_string()]
        );
    }

    #[test]
    fn test_mount_invalid_definition_rejected() {
        let operator = MountOperator::new();
        let mut def = sample();
        def.local_mount_point = String::new();
        let outcome = operator.mount(&def);
        assert!(!outcome.success);
        assert_eq!(outcome.kind, OutcomeKind::InvalidDefinition);
    }

    #[test]
    fn test_lock_for_same_path_shares_lock() {
        let operator = MountOperator::new();
        let a = operator.lock_for(Path::new("/mnt/x"));
        let b = operator.lock_for(Path::new("/mnt/x"));
        let c = operator.lock_for(Path::new("/mnt/y"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
