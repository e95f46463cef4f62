//! Small shared helpers

pub mod path;

pub use path::expand_home;
