//! Connection definition data model
//!
//! A `ConnectionDefinition` names one remote sshfs target. The serialized
//! field names match the original connections.json format, so existing config
//! files keep loading; absent `port`/`remote_path` fall back to defaults.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::expand_home;

/// Stable identifier assigned when a definition enters the store.
///
/// All mount/unmount/status dispatch keys on this rather than a row index, so
/// reordering or removal of other entries never redirects an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// One remote mount target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionDefinition {
    /// User-facing label. Uniqueness is not enforced; callers key by id.
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub remote_path: String,
    pub local_mount_point: String,
    /// Optional identity file path; empty means password auth.
    pub ssh_key: String,
    /// Whitespace-delimited extra sshfs arguments, passed through verbatim.
    pub extra_options: String,
}

impl Default for ConnectionDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: String::new(),
            port: 22,
            username: String::new(),
            remote_path: "/".to_string(),
            local_mount_point: String::new(),
            ssh_key: String::new(),
            extra_options: String::new(),
        }
    }
}

impl ConnectionDefinition {
    /// Defensive validation of fields the mount tools cannot do without.
    ///
    /// The form layer validates before saving; this backstop keeps an
    /// impossible definition from reaching a subprocess invocation.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("Connection name is required");
        }
        if self.host.trim().is_empty() {
            bail!("Host is required");
        }
        if self.port == 0 {
            bail!("Port must be between 1 and 65535");
        }
        if self.username.trim().is_empty() {
            bail!("Username is required");
        }
        if self.local_mount_point.trim().is_empty() {
            bail!("Local mount point is required");
        }
        Ok(())
    }

    /// The sshfs remote target string, `user@host:remote_path`.
    pub fn remote_target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.remote_path)
    }

    /// Local mount point with home shorthand expanded.
    pub fn mount_point(&self) -> PathBuf {
        expand_home(&self.local_mount_point)
    }

    /// Identity file path with home shorthand expanded, if one is configured.
    pub fn identity_file(&self) -> Option<PathBuf> {
        let trimmed = self.ssh_key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(expand_home(trimmed))
        }
    }

    /// Extra sshfs arguments, whitespace-split, unvalidated.
    pub fn extra_args(&self) -> Vec<String> {
        self.extra_options
            .split_whitespace()
            .map(str::to_string)
            .collect()
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
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let def = ConnectionDefinition::default();
        assert_eq!(def.port, 22);
        assert_eq!(def.remote_path, "/");
    }

    #[test]
    fn test_remote_target() {
        assert_eq!(sample().remote_target(), "alice@h.example.com:/home/alice");
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(sample().validate().is_ok());

        let mut def = sample();
        def.name.clear();
        assert!(def.validate().is_err());

        let mut def = sample();
        def.host = "   ".to_string();
        assert!(def.validate().is_err());

        let mut def = sample();
        def.username.clear();
        assert!(def.validate().is_err());

        let mut def = sample();
        def.local_mount_point.clear();
        assert!(def.validate().is_err());

        let mut def = sample();
        def.port = 0;
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_identity_file_empty_is_none() {
        let mut def = sample();
        assert!(def.identity_file().is_none());
        def.ssh_key = "/home/alice/.ssh/id_rsa".to_string();
        assert_eq!(
            def.identity_file(),
            Some(PathBuf::from("/home/alice/.ssh/id_rsa"))
        );
    }

    #[test]
    fn test_extra_args_split() {
        let mut def = sample();
        assert!(def.extra_args().is_empty());
        def.extra_options = "-o reconnect,ServerAliveInterval=15  -C".to_string();
        assert_eq!(
            def.extra_args(),
            vec!["-o", "reconnect,ServerAliveInterval=15", "-C"]
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        // Absent port and remote_path fall back to 22 and "/".
        let json = r#"{
            "name": "home",
            "host": "h.example.com",
            "username": "alice",
            "local_mount_point": "/mnt/home"
        }"#;
        let def: ConnectionDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.port, 22);
        assert_eq!(def.remote_path, "/");
        assert_eq!(def.ssh_key, "");
        assert_eq!(def.extra_options, "");
    }
}
