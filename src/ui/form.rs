//! Add/edit connection form
//!
//! Field-by-field editing state for the connection dialog, kept independent
//! of rendering so validation is unit-testable.

use anyhow::{bail, Result};

use crate::connections::ConnectionDefinition;

/// Field labels in display order.
pub const FIELD_LABELS: [&str; 8] = [
    "Connection Name",
    "Host",
    "Port",
    "Username",
    "Remote Path",
    "Local Mount Point",
    "SSH Key",
    "Extra Options",
];

const FIELD_NAME: usize = 0;
const FIELD_HOST: usize = 1;
const FIELD_PORT: usize = 2;
const FIELD_USERNAME: usize = 3;
const FIELD_REMOTE_PATH: usize = 4;
const FIELD_MOUNT_POINT: usize = 5;
const FIELD_SSH_KEY: usize = 6;
const FIELD_EXTRA: usize = 7;

/// Editing state for one connection definition.
#[derive(Debug, Clone)]
pub struct ConnectionForm {
    pub fields: [String; 8],
    pub selected: usize,
    /// Last validation error, shown in the form overlay until the next edit.
    pub error: Option<String>,
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionForm {
    /// Empty form with the usual defaults pre-filled.
    pub fn new() -> Self {
        let mut fields: [String; 8] = Default::default();
        fields[FIELD_PORT] = "22".to_string();
        fields[FIELD_REMOTE_PATH] = "/".to_string();
        Self {
            fields,
            selected: 0,
            error: None,
        }
    }

    pub fn from_definition(def: &ConnectionDefinition) -> Self {
        Self {
            fields: [
                def.name.clone(),
                def.host.clone(),
                def.port.to_string(),
                def.username.clone(),
                def.remote_path.clone(),
                def.local_mount_point.clone(),
                def.ssh_key.clone(),
                def.extra_options.clone(),
            ],
            selected: 0,
            error: None,
        }
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected == 0 {
            self.selected = self.fields.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn input(&mut self, c: char) {
        self.error = None;
        self.fields[self.selected].push(c);
    }

    pub fn backspace(&mut self) {
        self.error = None;
        self.fields[self.selected].pop();
    }

    /// Validate and build a definition from the current field values.
    pub fn to_definition(&self) -> Result<ConnectionDefinition> {
        if self.fields[FIELD_NAME].trim().is_empty() {
            bail!("Connection name is required");
        }
        if self.fields[FIELD_HOST].trim().is_empty() {
            bail!("Host is required");
        }
        if self.fields[FIELD_USERNAME].trim().is_empty() {
            bail!("Username is required");
        }
        if self.fields[FIELD_MOUNT_POINT].trim().is_empty() {
            bail!("Local mount point is required");
        }

        let port_text = self.fields[FIELD_PORT].trim();
        let port: u16 = if port_text.is_empty() {
            22
        } else {
            match port_text.parse() {
                Ok(p) if p > 0 => p,
                _ => bail!("Port must be a number between 1 and 65535"),
            }
        };

        let remote_path = self.fields[FIELD_REMOTE_PATH].trim();
        let remote_path = if remote_path.is_empty() {
            "/".to_string()
        } else {
            remote_path.to_string()
        };

        Ok(ConnectionDefinition {
            name: self.fields[FIELD_NAME].trim().to_string(),
            host: self.fields[FIELD_HOST].trim().to_string(),
            port,
            username: self.fields[FIELD_USERNAME].trim().to_string(),
            remote_path,
            local_mount_point: self.fields[FIELD_MOUNT_POINT].trim().to_string(),
            ssh_key: self.fields[FIELD_SSH_KEY].trim().to_string(),
            extra_options: self.fields[FIELD_EXTRA].trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> ConnectionForm {
        let mut form = ConnectionForm::new();
        form.fields[FIELD_NAME] = "home".to_string();
        form.fields[FIELD_HOST] = "h.example.com".to_string();
        form.fields[FIELD_USERNAME] = "alice".to_string();
        form.fields[FIELD_MOUNT_POINT] = "/mnt/home".to_string();
        form
    }

    #[test]
    fn test_defaults_prefilled() {
        let form = ConnectionForm::new();
        assert_eq!(form.fields[FIELD_PORT], "22");
        assert_eq!(form.fields[FIELD_REMOTE_PATH], "/");
    }

    #[test]
    fn test_to_definition_valid() {
        let def = filled().to_definition().unwrap();
        assert_eq!(def.name, "home");
        assert_eq!(def.port, 22);
        assert_eq!(def.remote_path, "/");
    }

    #[test]
    fn test_to_definition_requires_fields() {
        for field in [FIELD_NAME, FIELD_HOST, FIELD_USERNAME, FIELD_MOUNT_POINT] {
            let mut form = filled();
            form.fields[field].clear();
            assert!(form.to_definition().is_err(), "field {} should be required", field);
        }
    }

    #[test]
    fn test_to_definition_bad_port() {
        let mut form = filled();
        form.fields[FIELD_PORT] = "not-a-port".to_string();
        assert!(form.to_definition().is_err());

        form.fields[FIELD_PORT] = "0".to_string();
        assert!(form.to_definition().is_err());

        form.fields[FIELD_PORT] = "70000".to_string();
        assert!(form.to_definition().is_err());
    }

    #[test]
    fn test_empty_port_and_remote_path_fall_back() {
        let mut form = filled();
        form.fields[FIELD_PORT].clear();
        form.fields[FIELD_REMOTE_PATH].clear();
        let def = form.to_definition().unwrap();
        assert_eq!(def.port, 22);
        assert_eq!(def.remote_path, "/");
    }

    #[test]
    fn test_round_trip_through_form() {
        let def = filled().to_definition().unwrap();
        let form = ConnectionForm::from_definition(&def);
        assert_eq!(form.to_definition().unwrap(), def);
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = ConnectionForm::new();
        form.prev_field();
        assert_eq!(form.selected, FIELD_LABELS.len() - 1);
        form.next_field();
        assert_eq!(form.selected, 0);
    }
}
