//! Mount lifecycle core
//!
//! Subprocess runner, mount-table probe, the mount/unmount state machine and
//! the periodic status reconciliation loop.

pub mod operator;
pub mod probe;
pub mod runner;
pub mod status;

pub use operator::{MountOperator, OperationOutcome, OutcomeKind, Tools};
pub use probe::{tool_on_path, MountProbe, ProbeResult};
pub use runner::{run_command, CommandOutput};
pub use status::{unmount_all_mounted, StatusBoard, StatusPoller, DEFAULT_POLL_INTERVAL};

use anyhow::Result;

use crate::connections::{ConnectionDefinition, ConnectionStore};

/// Remove the definition at `index`, attempting an unmount first if its mount
/// point is currently observed mounted.
///
/// Exactly one unmount attempt is made; its outcome is returned for reporting
/// but never blocks the removal.
pub fn remove_connection(
    store: &mut ConnectionStore,
    index: usize,
    operator: &MountOperator,
) -> Result<(ConnectionDefinition, Option<OperationOutcome>)> {
    let unmount_outcome = match store.get(index) {
        Some(def) if operator.probe().is_mounted(&def.mount_point()) => {
            Some(operator.unmount(def))
        }
        _ => None,
    };
    let removed = store.remove(index)?;
    Ok((removed, unmount_outcome))
}
