//! Terminal user interface
//!
//! Presentation layer over the connection store and mount operator: a
//! connection table with per-row status, an add/edit form, delete and exit
//! confirmations. All observed state comes from the shared status board the
//! background poller keeps fresh.

pub mod form;
pub mod render;
pub mod runner;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::connections::{ConnectionId, ConnectionStore, ConnectionsFile};
use crate::mount::{self, MountOperator, StatusBoard};
use crate::ui::form::ConnectionForm;

/// Which screen/overlay the TUI is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Table,
    Form,
    ConfirmRemove,
    ConfirmExit,
}

/// Top-level TUI state.
pub struct App {
    pub state: AppState,
    pub store: Arc<Mutex<ConnectionStore>>,
    pub operator: Arc<MountOperator>,
    pub board: StatusBoard,
    pub selected: usize,
    /// One-line status message shown in the footer.
    pub status_line: String,
    pub form: ConnectionForm,
    /// Id being edited; `None` while adding a new connection.
    pub editing: Option<ConnectionId>,
    /// One-time warning when sshfs is missing from the system path.
    pub sshfs_warning: Option<String>,
    pub exit_requested: bool,
    file: ConnectionsFile,
}

impl App {
    pub fn new(
        store: Arc<Mutex<ConnectionStore>>,
        operator: Arc<MountOperator>,
        board: StatusBoard,
        file: ConnectionsFile,
    ) -> Self {
        Self {
            state: AppState::Table,
            store,
            operator,
            board,
            selected: 0,
            status_line: "Ready".to_string(),
            form: ConnectionForm::new(),
            editing: None,
            sshfs_warning: None,
            exit_requested: false,
            file,
        }
    }

    fn store(&self) -> MutexGuard<'_, ConnectionStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// `(id, definition, mounted)` rows for rendering.
    pub fn rows(&self) -> Vec<(ConnectionId, crate::connections::ConnectionDefinition, bool)> {
        self.store()
            .list_with_ids()
            .into_iter()
            .map(|(id, def)| {
                let mounted = self.board.is_mounted(id);
                (id, def, mounted)
            })
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.store().len()
    }

    pub fn select_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_down(&mut self) {
        let len = self.connection_count();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.connection_count();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Write the store to disk; persistence failures are reported, not fatal.
    pub fn save(&mut self) {
        let defs = self.store().list();
        if let Err(e) = self.file.save(&defs) {
            tracing::error!("Failed to save connections: {}", e);
            self.status_line = format!("Failed to save connections: {}", e);
        }
    }

    pub fn begin_add(&mut self) {
        self.form = ConnectionForm::new();
        self.editing = None;
        self.state = AppState::Form;
    }

    pub fn begin_edit(&mut self) {
        let (id, def) = {
            let store = self.store();
            match store.id_at(self.selected).zip(store.get(self.selected).cloned()) {
                Some(pair) => pair,
                None => {
                    drop(store);
                    self.status_line = "Select a connection to edit".to_string();
                    return;
                }
            }
        };
        self.form = ConnectionForm::from_definition(&def);
        self.editing = Some(id);
        self.state = AppState::Form;
    }

    /// Validate the form and commit it to the store. On validation failure
    /// the form stays open with the error shown.
    pub fn submit_form(&mut self) {
        let def = match self.form.to_definition() {
            Ok(def) => def,
            Err(e) => {
                self.form.error = Some(e.to_string());
                return;
            }
        };

        let name = def.name.clone();
        let result = {
            let mut store = self.store();
            match self.editing {
                Some(id) => match store.index_of(id) {
                    Some(index) => store.update(index, def),
                    // Entry vanished while the form was open; append instead.
                    None => {
                        store.add(def);
                        Ok(())
                    }
                },
                None => {
                    store.add(def);
                    Ok(())
                }
            }
        };

        match result {
            Ok(()) => {
                self.status_line = match self.editing {
                    Some(_) => format!("Updated connection: {}", name),
                    None => format!("Added connection: {}", name),
                };
                self.save();
                self.state = AppState::Table;
                self.clamp_selection();
            }
            Err(e) => {
                self.form.error = Some(e.to_string());
            }
        }
    }

    pub fn cancel_form(&mut self) {
        self.state = AppState::Table;
    }

    pub fn selected_name(&self) -> Option<String> {
        self.store().get(self.selected).map(|d| d.name.clone())
    }

    /// Remove the selected connection, attempting an unmount first if it is
    /// currently observed mounted.
    pub fn remove_selected(&mut self) {
        let outcome = {
            let mut store = self.store();
            mount::remove_connection(&mut store, self.selected, &self.operator)
        };
        match outcome {
            Ok((removed, unmounted)) => {
                if let Some(unmounted) = unmounted {
                    tracing::info!(
                        "Unmount before removal of {}: {}",
                        removed.name,
                        unmounted.message
                    );
                }
                self.status_line = format!("Removed connection: {}", removed.name);
                self.save();
                self.clamp_selection();
            }
            Err(e) => {
                self.status_line = format!("Remove failed: {}", e);
            }
        }
        self.state = AppState::Table;
    }

    pub fn mount_selected(&mut self) {
        let (id, def) = {
            let store = self.store();
            match store.id_at(self.selected).zip(store.get(self.selected).cloned()) {
                Some(pair) => pair,
                None => {
                    drop(store);
                    self.status_line = "Select a connection to mount".to_string();
                    return;
                }
            }
        };

        let outcome = self.operator.mount(&def);
        self.status_line = if outcome.success {
            format!("Mounted: {}", def.name)
        } else {
            format!("{}: {}", def.name, outcome.message)
        };
        // Re-probe rather than trusting the attempt's own claim.
        self.board
            .record(id, self.operator.probe().is_mounted(&def.mount_point()));
    }

    pub fn unmount_selected(&mut self) {
        let (id, def) = {
            let store = self.store();
            match store.id_at(self.selected).zip(store.get(self.selected).cloned()) {
                Some(pair) => pair,
                None => {
                    drop(store);
                    self.status_line = "Select a connection to unmount".to_string();
                    return;
                }
            }
        };

        let outcome = self.operator.unmount(&def);
        self.status_line = if outcome.success {
            format!("Unmounted: {}", def.name)
        } else {
            format!("{}: {}", def.name, outcome.message)
        };
        self.board
            .record(id, self.operator.probe().is_mounted(&def.mount_point()));
    }

    /// Re-probe every connection right now.
    pub fn refresh_now(&mut self) {
        mount::status::refresh_statuses(&self.store, self.operator.probe(), &self.board);
        self.status_line = "Status refreshed".to_string();
    }

    /// Number of connections currently observed mounted, after a fresh probe.
    pub fn mounted_count(&self) -> usize {
        mount::status::refresh_statuses(&self.store, self.operator.probe(), &self.board);
        self.store()
            .list_with_ids()
            .iter()
            .filter(|(id, _)| self.board.is_mounted(*id))
            .count()
    }

    /// Best-effort unmount of everything mounted, for the exit path.
    pub fn unmount_all(&mut self) {
        let store = self.store();
        let results = mount::unmount_all_mounted(&store, &self.operator);
        drop(store);
        tracing::info!("Shutdown sweep unmounted {} connection(s)", results.len());
    }
}
