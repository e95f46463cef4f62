//! sshfs-manager library crate
//!
//! Exposes internal modules for integration tests and reuse by the binary.

pub mod connections;
pub mod mount;
pub mod ui;
pub mod utils;
