//! Version
//!
//! Version of this package and a small semver parser shared with the
//! runtime version gate.

use std::fmt;

/// Package version, recorded in every cache identifier.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package version string.
pub fn version_string() -> String {
    format!("Angular Build v{}", VERSION)
}

/// Version information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
    /// Prerelease tag.
    pub prerelease: Option<String>,
}

impl Version {
    /// Parse a version such as `16.10.0`, `v18.2.1` or `17.0.0-rc.1`.
    ///
    /// Runtimes print their version with a leading `v`, which is accepted.
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim();
        let version = version.strip_prefix('v').unwrap_or(version);
        let (version_part, prerelease) = match version.split_once('-') {
            Some((base, pre)) => (base, Some(pre.to_string())),
            None => (version, None),
        };

        let nums: Vec<&str> = version_part.split('.').collect();
        if nums.len() != 3 {
            return None;
        }

        Some(Self {
            major: nums[0].parse().ok()?,
            minor: nums[1].parse().ok()?,
            patch: nums[2].parse().ok()?,
            prerelease,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}
