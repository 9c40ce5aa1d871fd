//! Logging
//!
//! Level-filtered logger used by transform sessions and the CLI.

pub mod src;


pub use src::console_logger::*;
pub use src::logger::*;
