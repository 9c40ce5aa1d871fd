//! Bootstrap
//!
//! Environment validation performed before any entry point runs.

pub mod version_gate;

pub use version_gate::*;
