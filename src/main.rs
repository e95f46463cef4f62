//! sshfs-manager: SSHFS mount manager
//!
//! Keeps a list of SSH connection definitions, mounts and unmounts them via
//! sshfs, and shows live mount status in a TUI or through one-shot CLI
//! commands.

use anyhow::{bail, Result};
use clap::Parser;
use std::sync::{Arc, Mutex};

use sshfs_manager::connections::{ConnectionStore, ConnectionsFile};
use sshfs_manager::mount::{
    self, tool_on_path, MountOperator, StatusBoard, StatusPoller, DEFAULT_POLL_INTERVAL,
};
use sshfs_manager::ui::{runner::run_loop, App};

fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging();

    let file = match args.config.clone() {
        Some(path) => ConnectionsFile::new(path),
        None => ConnectionsFile::default_location()?,
    };

    let definitions = match file.load() {
        Ok(definitions) => definitions,
        Err(e) => {
            tracing::error!("Failed to load connections from {:?}: {}", file.path(), e);
            eprintln!(
                "Warning: could not load connections from {:?}: {}",
                file.path(),
                e
            );
            Vec::new()
        }
    };

    let store = Arc::new(Mutex::new(ConnectionStore::from_definitions(definitions)));
    let operator = Arc::new(MountOperator::new());
    let board = StatusBoard::new();

    let sshfs_warning = if tool_on_path("sshfs") {
        None
    } else {
        tracing::warn!("sshfs not found on PATH");
        Some("sshfs not found; mounting will fail until it is installed".to_string())
    };

    if !args.tui {
        if args.list {
            return run_list(&store);
        }
        if args.status {
            return run_status(&store, &operator);
        }
        if let Some(name) = args.mount {
            return run_mount(&store, &operator, &name);
        }
        if let Some(name) = args.unmount {
            return run_unmount(&store, &operator, &name);
        }
        if args.unmount_all {
            return run_unmount_all(&store, &operator);
        }
    }

    // Default mode is the TUI.
    if let Some(warning) = &sshfs_warning {
        eprintln!("Warning: {}", warning);
    }

    let poller = StatusPoller::spawn(
        store.clone(),
        operator.probe().clone(),
        board.clone(),
        DEFAULT_POLL_INTERVAL,
    );

    let mut app = App::new(store, operator, board, file);
    app.sshfs_warning = sshfs_warning;
    app.refresh_now();
    let result = run_loop(&mut app);

    drop(poller);
    result
}

fn run_list(store: &Mutex<ConnectionStore>) -> Result<()> {
    let store = lock(store);
    if store.is_empty() {
        println!("No connections configured.");
        return Ok(());
    }
    for def in store.list() {
        println!(
            "{}: {} -> {}",
            def.name,
            def.remote_target(),
            def.local_mount_point
        );
    }
    Ok(())
}

fn run_status(store: &Mutex<ConnectionStore>, operator: &MountOperator) -> Result<()> {
    let store = lock(store);
    for def in store.list() {
        let status = if operator.probe().is_mounted(&def.mount_point()) {
            "mounted"
        } else {
            "not mounted"
        };
        println!("{}: {}", def.name, status);
    }
    Ok(())
}

fn run_mount(store: &Mutex<ConnectionStore>, operator: &MountOperator, name: &str) -> Result<()> {
    let def = {
        let store = lock(store);
        match store.find_by_name(name) {
            Some((_, def)) => def.clone(),
            None => bail!("No connection named '{}'", name),
        }
    };
    let outcome = operator.mount(&def);
    println!("{}: {}", def.name, outcome.message);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn run_unmount(store: &Mutex<ConnectionStore>, operator: &MountOperator, name: &str) -> Result<()> {
    let def = {
        let store = lock(store);
        match store.find_by_name(name) {
            Some((_, def)) => def.clone(),
            None => bail!("No connection named '{}'", name),
        }
    };
    let outcome = operator.unmount(&def);
    println!("{}: {}", def.name, outcome.message);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn run_unmount_all(store: &Mutex<ConnectionStore>, operator: &MountOperator) -> Result<()> {
    let store = lock(store);
    let results = mount::unmount_all_mounted(&store, operator);
    if results.is_empty() {
        println!("Nothing mounted.");
        return Ok(());
    }
    let mut failures = 0;
    for (name, outcome) in results {
        println!("{}: {}", name, outcome.message);
        if !outcome.success {
            failures += 1;
        }
    }
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn lock(store: &Mutex<ConnectionStore>) -> std::sync::MutexGuard<'_, ConnectionStore> {
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Log to a file in the user data directory; the terminal belongs to the TUI.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let log_dir = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sshfs-manager");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let log_path = log_dir.join("sshfs-manager.log");
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// CLI arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "SSHFS mount manager")]
struct Cli {
    /// Path to the connections file (defaults to the user config directory)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Launch the interactive TUI (the default when no other mode is given)
    #[arg(long, default_value_t = false)]
    tui: bool,

    /// List configured connections and exit
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Show mount status for each connection and exit
    #[arg(long, default_value_t = false)]
    status: bool,

    /// Mount the named connection and exit
    #[arg(long, value_name = "NAME")]
    mount: Option<String>,

    /// Unmount the named connection and exit
    #[arg(long, value_name = "NAME")]
    unmount: Option<String>,

    /// Unmount every mounted connection and exit
    #[arg(long, default_value_t = false)]
    unmount_all: bool,
}
