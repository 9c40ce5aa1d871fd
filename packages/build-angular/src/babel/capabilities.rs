//! Capabilities
//!
//! External entry points (the linker's detector and plugin factory, the
//! localize tools' plugin creators) are loaded lazily, at most once per
//! session. Loads that a file cannot do without are [`Required`]: their
//! outcome is memoized whether it succeeded or not. Loads that only degrade
//! the output are [`Optional`]: failures are not memoized, so the next file
//! that needs the capability tries again.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::OnceCell;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

use super::options::PluginDescriptor;
use crate::logging::Logger;

/// Decides whether a file contains partial declarations that must be linked.
pub trait LinkingDetector: Send + Sync {
    fn needs_linking(&self, path: &str, source: &str) -> bool;
}

/// Creates the Babel plugin that links partial declarations.
pub trait LinkerPluginFactory: Send + Sync {
    fn create_linker_plugin(&self, jit_mode: bool) -> PluginDescriptor;
}

/// Creates the Babel plugins that inline translations and the locale.
pub trait LocalePluginCreators: Send + Sync {
    fn create_translate_plugin(&self, es5: bool) -> PluginDescriptor;
    fn create_locale_plugin(&self, locale: &str) -> PluginDescriptor;
}

/// Loads capabilities from wherever the host keeps them.
pub trait CapabilityLoader: Send + Sync {
    fn load_linking_detector(&self) -> Result<Arc<dyn LinkingDetector>, CapabilityError>;
    fn load_linker_plugin_factory(&self) -> Result<Arc<dyn LinkerPluginFactory>, CapabilityError>;
    fn load_locale_plugin_creators(
        &self,
    ) -> Result<Arc<dyn LocalePluginCreators>, CapabilityError>;
}

/// Names of the lazily loaded capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityName {
    LinkingDetector,
    LinkerPluginFactory,
    LocalePluginCreators,
}

impl CapabilityName {
    /// Entry point the capability is loaded from.
    pub fn entry_point(&self) -> &'static str {
        match self {
            CapabilityName::LinkingDetector => "@angular/compiler-cli/linker",
            CapabilityName::LinkerPluginFactory => "@angular/compiler-cli/linker/babel",
            CapabilityName::LocalePluginCreators => "@angular/localize/tools",
        }
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityName::LinkingDetector => "linking detector",
            CapabilityName::LinkerPluginFactory => "linker plugin factory",
            CapabilityName::LocalePluginCreators => "locale plugin creators",
        };
        write!(f, "{} ({})", name, self.entry_point())
    }
}

/// A capability could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {capability}: {message}")]
pub struct CapabilityError {
    pub capability: CapabilityName,
    pub message: String,
}

impl CapabilityError {
    pub fn new(capability: CapabilityName, message: impl Into<String>) -> Self {
        Self {
            capability,
            message: message.into(),
        }
    }
}

/// A capability the caller cannot proceed without.
///
/// Loaded once; the result, success or failure, is kept for the lifetime of
/// the cell. Concurrent first callers block until the single load finishes.
pub struct Required<T> {
    cell: OnceCell<Result<T, CapabilityError>>,
}

impl<T: Clone> Required<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<T, CapabilityError>
    where
        F: FnOnce() -> Result<T, CapabilityError>,
    {
        self.cell.get_or_init(load).clone()
    }
}

impl<T: Clone> Default for Required<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A capability whose absence only degrades the output.
///
/// Only a successful load is kept. A failed load leaves the cell empty so
/// that a later caller retries.
pub struct Optional<T> {
    cell: OnceCell<T>,
}

impl<T: Clone> Optional<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<T, CapabilityError>
    where
        F: FnOnce() -> Result<T, CapabilityError>,
    {
        self.cell.get_or_try_init(load).cloned()
    }
}

impl<T: Clone> Default for Optional<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Path and xxh3 hash of the source text.
type LinkingKey = (String, u64);

/// Capability handles owned by one build session.
pub struct CapabilityCache {
    loader: Arc<dyn CapabilityLoader>,
    logger: Arc<dyn Logger>,
    linking_detector: Required<Arc<dyn LinkingDetector>>,
    linker_plugin_factory: Required<Arc<dyn LinkerPluginFactory>>,
    locale_plugin_creators: Optional<Arc<dyn LocalePluginCreators>>,
    linking_verdicts: Mutex<HashMap<LinkingKey, Arc<OnceCell<bool>>>>,
}

impl CapabilityCache {
    pub fn new(loader: Arc<dyn CapabilityLoader>, logger: Arc<dyn Logger>) -> Self {
        Self {
            loader,
            logger,
            linking_detector: Required::new(),
            linker_plugin_factory: Required::new(),
            locale_plugin_creators: Optional::new(),
            linking_verdicts: Mutex::new(HashMap::new()),
        }
    }

    pub fn linking_detector(&self) -> Result<Arc<dyn LinkingDetector>, CapabilityError> {
        self.linking_detector.get_or_load(|| {
            self.log_load(CapabilityName::LinkingDetector);
            self.loader.load_linking_detector()
        })
    }

    /// The detector's verdict for `(path, source)`.
    ///
    /// The detector runs at most once per distinct pair. The map lock is
    /// released before detection, so different files are detected in
    /// parallel while callers asking about the same file wait for one run.
    pub fn needs_linking(&self, path: &str, source: &str) -> Result<bool, CapabilityError> {
        let detector = self.linking_detector()?;
        let key = (path.to_string(), xxh3_64(source.as_bytes()));
        let verdict = {
            let mut verdicts = self
                .linking_verdicts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            verdicts.entry(key).or_default().clone()
        };
        Ok(*verdict.get_or_init(|| detector.needs_linking(path, source)))
    }

    pub fn linker_plugin_factory(&self) -> Result<Arc<dyn LinkerPluginFactory>, CapabilityError> {
        self.linker_plugin_factory.get_or_load(|| {
            self.log_load(CapabilityName::LinkerPluginFactory);
            self.loader.load_linker_plugin_factory()
        })
    }

    /// Locale plugin creators, or `None` when they cannot be loaded.
    ///
    /// Locale inlining still runs without them, the application preset
    /// falls back to its own handling.
    pub fn locale_plugin_creators(&self) -> Option<Arc<dyn LocalePluginCreators>> {
        let loaded = self.locale_plugin_creators.get_or_load(|| {
            self.log_load(CapabilityName::LocalePluginCreators);
            self.loader.load_locale_plugin_creators()
        });

        match loaded {
            Ok(creators) => Some(creators),
            Err(err) => {
                self.logger.warn(&format!("{}; continuing without it", err));
                None
            }
        }
    }

    fn log_load(&self, capability: CapabilityName) {
        self.logger.debug(&format!("Loading {}", capability));
    }
}
