//! Babel Transform Configuration
//!
//! Decides, per source file, which Angular-specific transforms the bundler's
//! Babel step must run and assembles the plugin and preset lists for it.
//!
//! The transform engine, the partial-declaration linker and the localize
//! tools are external collaborators. They are reached through the
//! capability traits in [`capabilities`] and loaded at most once per
//! [`TransformSession`].

pub mod builtin;
pub mod cache_key;
pub mod capabilities;
pub mod config;
pub mod custom_options;
pub mod diagnostics;
pub mod error;
pub mod linking;
pub mod options;

pub use builtin::BuiltinCapabilityLoader;
pub use cache_key::{cache_identifier, CacheKey};
pub use capabilities::*;
pub use config::*;
pub use custom_options::*;
pub use diagnostics::*;
pub use error::*;
pub use linking::requires_linking;
pub use options::*;
