//! Linking Requirement
//!
//! Decides whether a file contains partial declarations that the linker
//! plugin has to turn into full definitions.

use once_cell::sync::Lazy;
use regex::Regex;

use super::capabilities::{CapabilityCache, CapabilityError};

// @angular/core and @angular/compiler produce false positives; TypeScript
// sources are compiled by the application build and never contain partial
// declarations.
static NEVER_LINKED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\/]@angular[\\/](?:compiler|core)|\.tsx?$").unwrap());

/// Whether `path` is excluded from linking without consulting the detector.
pub fn is_never_linked(path: &str) -> bool {
    NEVER_LINKED.is_match(path)
}

/// Whether the file needs the linker plugin.
///
/// Excluded paths short-circuit before the detector capability is loaded.
/// Otherwise the detector's answer is authoritative, and is remembered for
/// the `(path, source)` pair.
pub fn requires_linking(
    capabilities: &CapabilityCache,
    path: &str,
    source: &str,
) -> Result<bool, CapabilityError> {
    if is_never_linked(path) {
        return Ok(false);
    }

    capabilities.needs_linking(path, source)
}
