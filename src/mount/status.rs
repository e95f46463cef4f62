//! Status reconciliation
//!
//! Observed mount state is never trusted beyond one polling interval: a
//! background poller re-probes every stored connection on a fixed cadence and
//! publishes the booleans to a shared board the presentation layer reads.
//! Probing happens on one thread per connection so a single slow host cannot
//! stall status delivery for the others.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::connections::{ConnectionId, ConnectionStore};
use crate::mount::operator::{MountOperator, OperationOutcome};
use crate::mount::probe::MountProbe;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct BoardInner {
    mounted: HashMap<ConnectionId, bool>,
    last_refresh: Option<DateTime<Local>>,
}

/// Shared view of the latest observed mount state per connection.
///
/// Always a point-in-time snapshot; consumers must not cache it across any
/// action that could have changed the mount table.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<BoardInner>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Latest observation for one connection; `false` when never probed.
    pub fn is_mounted(&self, id: ConnectionId) -> bool {
        self.lock().mounted.get(&id).copied().unwrap_or(false)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.lock().last_refresh
    }

    /// Replace the whole board with a fresh set of observations.
    pub fn publish(&self, observations: HashMap<ConnectionId, bool>) {
        let mut inner = self.lock();
        inner.mounted = observations;
        inner.last_refresh = Some(Local::now());
    }

    /// Record a single fresh observation (e.g. right after a mount attempt).
    pub fn record(&self, id: ConnectionId, mounted: bool) {
        self.lock().mounted.insert(id, mounted);
    }
}

/// Probe every stored connection once and publish the results.
///
/// Each connection is probed on its own thread, bounded by the per-path locks
/// in [`MountOperator`] only indirectly: probes are read-only and safe to run
/// alongside an in-flight action, whose final state the next tick observes.
pub fn refresh_statuses(store: &Mutex<ConnectionStore>, probe: &MountProbe, board: &StatusBoard) {
    let targets: Vec<(ConnectionId, std::path::PathBuf)> = {
        let store = match store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        store
            .list_with_ids()
            .into_iter()
            .map(|(id, def)| (id, def.mount_point()))
            .collect()
    };

    let handles: Vec<(ConnectionId, JoinHandle<bool>)> = targets
        .into_iter()
        .map(|(id, path)| {
            let probe = probe.clone();
            (id, thread::spawn(move || probe.is_mounted(&path)))
        })
        .collect();

    let mut observations = HashMap::new();
    for (id, handle) in handles {
        // A panicked probe thread counts as "not mounted" (fail-open).
        let mounted = handle.join().unwrap_or(false);
        observations.insert(id, mounted);
    }

    board.publish(observations);
}

/// Background poller re-deriving observed state from the OS on an interval.
pub struct StatusPoller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Start polling. The poller never panics the host: probe failures are
    /// absorbed as "not mounted".
    pub fn spawn(
        store: Arc<Mutex<ConnectionStore>>,
        probe: MountProbe,
        board: StatusBoard,
        interval: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                refresh_statuses(&store, &probe, &board);

                // Sleep in small steps so stop requests take effect promptly.
                let mut remaining = interval;
                let step = Duration::from_millis(100);
                while remaining > Duration::ZERO && !stop_flag.load(Ordering::Relaxed) {
                    let nap = remaining.min(step);
                    thread::sleep(nap);
                    remaining = remaining.saturating_sub(nap);
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Best-effort shutdown sweep: unmount every connection currently observed
/// mounted. Each attempt is independent; a failure is logged and swallowed so
/// it never aborts the rest of the sweep or the shutdown itself.
pub fn unmount_all_mounted(
    store: &ConnectionStore,
    operator: &MountOperator,
) -> Vec<(String, OperationOutcome)> {
    let mut results = Vec::new();
    for def in store.list() {
        if !operator.probe().is_mounted(&def.mount_point()) {
            continue;
        }
        let outcome = operator.unmount(&def);
        if !outcome.success {
            tracing::warn!(
                "Shutdown unmount of {} failed: {}",
                def.name,
                outcome.message
            );
        }
        results.push((def.name, outcome));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::ConnectionDefinition;

    fn named(name: &str) -> ConnectionDefinition {
        ConnectionDefinition {
            name: name.to_string(),
            host: "example.com".to_string(),
            username: "user".to_string(),
            local_mount_point: format!("/tmp/poller-test-{}", name),
            ..Default::default()
        }
    }

    #[test]
    fn test_board_defaults_to_not_mounted() {
        let board = StatusBoard::new();
        assert!(!board.is_mounted(ConnectionId(0)));
        assert!(board.last_refresh().is_none());
    }

    #[test]
    fn test_publish_and_record() {
        let board = StatusBoard::new();
        let mut observations = HashMap::new();
        observations.insert(ConnectionId(1), true);
        board.publish(observations);

        assert!(board.is_mounted(ConnectionId(1)));
        assert!(!board.is_mounted(ConnectionId(2)));
        assert!(board.last_refresh().is_some());

        board.record(ConnectionId(1), false);
        assert!(!board.is_mounted(ConnectionId(1)));
    }

    #[test]
    #[cfg(unix)]
    fn test_refresh_statuses_probes_every_connection() {
        let mut store = ConnectionStore::new();
        let a = store.add(named("a"));
        let b = store.add(named("b"));
        let store = Mutex::new(store);

        // `true` reports every path as mounted.
        let probe = MountProbe::new().with_command("true");
        let board = StatusBoard::new();
        refresh_statuses(&store, &probe, &board);
        assert!(board.is_mounted(a));
        assert!(board.is_mounted(b));

        // `false` reports nothing mounted.
        let probe = MountProbe::new().with_command("false");
        refresh_statuses(&store, &probe, &board);
        assert!(!board.is_mounted(a));
        assert!(!board.is_mounted(b));
    }

    #[test]
    #[cfg(unix)]
    fn test_poller_stops_cleanly() {
        let store = Arc::new(Mutex::new(ConnectionStore::new()));
        let probe = MountProbe::new().with_command("false");
        let board = StatusBoard::new();

        let mut poller = StatusPoller::spawn(
            store,
            probe,
            board,
            Duration::from_millis(50),
        );
        thread::sleep(Duration::from_millis(120));
        poller.stop();
    }
}
