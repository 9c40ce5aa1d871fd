#![deny(clippy::all)]

/**
 * Angular Build - Rust Implementation
 *
 * Babel transform configuration for Angular application builds
 */
pub mod babel;
pub mod bootstrap;
pub mod logging;
pub mod version;

/// Package version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
