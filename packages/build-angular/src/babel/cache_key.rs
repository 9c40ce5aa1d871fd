//! Cache Identifier
//!
//! The bundler caches transform results per identifier, so the identifier
//! must only depend on the effective configuration: object keys are sorted
//! recursively before serializing, making it independent of the order in
//! which options were written.

use std::fmt;

use serde_json::{json, Map, Value};
use xxhash_rust::xxh3::xxh3_64;

use super::options::{BaseOptions, RawOptions, ResolvedOptions};

/// Deterministic cache identifier for one file's transform configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    identifier: String,
}

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.identifier
    }

    pub fn into_string(self) -> String {
        self.identifier
    }

    /// Compact fingerprint of the identifier.
    pub fn fingerprint(&self) -> u64 {
        xxh3_64(self.identifier.as_bytes())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Build the cache identifier from the tool version, the resolved options,
/// the static base options and the raw caller options.
pub fn cache_identifier(
    version: &str,
    custom: &ResolvedOptions,
    base: &BaseOptions,
    raw: &RawOptions,
) -> Result<CacheKey, serde_json::Error> {
    let custom = serde_json::to_value(custom)?;
    let base = serde_json::to_value(base)?;
    let value = json!({
        "buildAngular": version,
        "customOptions": custom,
        "baseOptions": base,
        "rawOptions": raw,
    });

    let identifier = serde_json::to_string(&canonicalize(value))?;
    Ok(CacheKey { identifier })
}

/// Rebuild every object with its keys in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
