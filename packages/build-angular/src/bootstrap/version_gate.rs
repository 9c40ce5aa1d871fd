//! Runtime Version Gate
//!
//! Decides whether the host runtime may run the build. Unsupported runtimes
//! terminate with a fixed exit code, odd-numbered (non-LTS) releases only
//! produce a warning.

use crate::version::Version;

/// Process exit code used when the runtime version is unsupported.
pub const UNSUPPORTED_VERSION_EXIT_CODE: i32 = 3;

/// Outcome of the runtime version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    /// Proceed to the entry point.
    Supported,
    /// Proceed to the entry point after printing the message.
    Warn(String),
    /// Print the message and exit with [`UNSUPPORTED_VERSION_EXIT_CODE`].
    Unsupported(String),
}

impl VersionCheck {
    /// Exit code to terminate with, if the entry point must not run.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            VersionCheck::Unsupported(_) => Some(UNSUPPORTED_VERSION_EXIT_CODE),
            VersionCheck::Supported | VersionCheck::Warn(_) => None,
        }
    }
}

/// Classify a runtime version string such as `v16.10.0`.
pub fn check_runtime_version(version: &str) -> VersionCheck {
    let Some(parsed) = Version::parse(version) else {
        return VersionCheck::Unsupported(format!(
            "Unable to determine the Node.js version from '{}'.",
            version
        ));
    };

    // Odd releases never enter LTS but newer ones are allowed to run.
    if parsed.major % 2 == 1 && parsed.major > 16 {
        return VersionCheck::Warn(format!(
            "Node.js version v{} detected.\n\
             Odd numbered Node.js versions will not enter LTS status and should not be used for production.",
            parsed
        ));
    }

    if is_below_minimum(&parsed) {
        return VersionCheck::Unsupported(format!(
            "Node.js version v{} detected.\n\
             The Angular CLI requires a minimum Node.js version of either v12.14, v14.15, or v16.10.\n\n\
             Please update your Node.js version or visit https://nodejs.org/ for additional instructions.\n",
            parsed
        ));
    }

    VersionCheck::Supported
}

fn is_below_minimum(version: &Version) -> bool {
    match version.major {
        0..=11 | 13 | 15 => true,
        12 => version.minor < 14,
        14 => version.minor < 15,
        16 => version.minor < 10,
        _ => false,
    }
}
