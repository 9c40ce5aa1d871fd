//! Custom Options
//!
//! Resolves, per file, which Angular transforms Babel has to run and the
//! loader options it runs with. Files that need none of them are bypassed
//! entirely: even an empty Babel run costs time and disturbs source maps.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::builtin::BuiltinCapabilityLoader;
use super::cache_key::cache_identifier;
use super::capabilities::{CapabilityCache, CapabilityLoader};
use super::config::{configure, TransformConfig};
use super::diagnostics::DiagnosticReporter;
use super::error::TransformConfigError;
use super::linking::requires_linking;
use super::options::{
    BaseOptions, CallerOptions, FileContext, InstrumentCodeOptions, LinkerOptions,
    LocalizationOptions, OptimizeFlags, ProcessReasons, RawOptions, ResolvedOptions, ScriptTarget,
};
use crate::logging::{Logger, NullLogger};
use crate::version::VERSION;

static JS_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[cm]?js$").unwrap());

// Packages in these directories ship code that is already downleveled.
// Approximation: a file there can still use native async; the source check
// below catches the common case only.
static ES2015_PACKAGE_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\/][_f]?esm2015[\\/]").unwrap());

static LOCALIZE_TOOLING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\/]@angular[\\/](?:compiler|localize)").unwrap());

static ANGULAR_PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\/]node_modules[\\/]@angular[\\/]").unwrap());

static NODE_MODULES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\\/]node_modules[\\/]").unwrap());

const ASYNC_MARKER: &str = "async";
const LOCALIZE_MARKER: &str = "$localize";

/// Options for the Babel loader of one file.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Base options overlaid with the caller's raw options.
    pub options: RawOptions,
    pub cache_identifier: String,
    /// Babel must skip the file.
    pub ignore: bool,
}

impl LoaderOptions {
    pub fn is_bypassed(&self) -> bool {
        self.ignore
    }

    pub fn to_value(&self) -> Value {
        let mut map: Map<String, Value> = self.options.clone();
        map.insert(
            "cacheIdentifier".to_string(),
            Value::String(self.cache_identifier.clone()),
        );
        if self.ignore {
            map.insert("ignore".to_string(), Value::Bool(true));
        }
        Value::Object(map)
    }
}

/// Custom options for the application preset and options for the loader.
#[derive(Debug, Clone)]
pub struct CustomOptionsResult {
    pub custom: ResolvedOptions,
    pub loader: LoaderOptions,
}

/// One build's option resolution state.
///
/// Owns the capability cache, so capabilities are loaded at most once per
/// session however many files are resolved, from however many threads.
pub struct TransformSession {
    capabilities: CapabilityCache,
    base_options: BaseOptions,
    logger: Arc<dyn Logger>,
}

impl TransformSession {
    pub fn new(loader: Arc<dyn CapabilityLoader>, logger: Arc<dyn Logger>) -> Self {
        Self {
            capabilities: CapabilityCache::new(loader, logger.clone()),
            base_options: BaseOptions::default(),
            logger,
        }
    }

    /// Session backed by the built-in capabilities.
    pub fn builtin(logger: Arc<dyn Logger>) -> Self {
        Self::new(Arc::new(BuiltinCapabilityLoader), logger)
    }

    /// Resolve the Angular transforms `file` needs.
    pub fn resolve(
        &self,
        file: &FileContext,
        caller: &CallerOptions,
    ) -> Result<ResolvedOptions, TransformConfigError> {
        let path = file.path.as_str();
        let source = file.source.as_str();
        let mut custom = ResolvedOptions {
            supported_browsers: caller.supported_browsers.clone(),
            ..ResolvedOptions::default()
        };

        if caller.has_plugins() {
            custom.reasons |= ProcessReasons::PLUGINS;
        }

        if requires_linking(&self.capabilities, path, source)? {
            let linker_plugin_creator = self.capabilities.linker_plugin_factory()?;
            custom.angular_linker = Some(LinkerOptions {
                should_link: true,
                jit_mode: caller.aot != Some(true),
                linker_plugin_creator,
            });
            custom.reasons |= ProcessReasons::LINKING;
        }

        if let Some(target) = caller.script_target {
            if target < ScriptTarget::ES2015 {
                custom.force_es5 = true;
            } else if target >= ScriptTarget::ES2017 || JS_FILE.is_match(path) {
                // Application code only contains native async when targeting
                // ES2017+, third-party code can contain it at any target.
                custom.force_async_transformation =
                    !ES2015_PACKAGE_DIR.is_match(path) && source.contains(ASYNC_MARKER);
            }
            if custom.force_async_transformation || custom.force_es5 {
                custom.reasons |= ProcessReasons::DOWNLEVEL;
            }
        }

        if let Some(i18n) = &caller.i18n {
            if !LOCALIZE_TOOLING.is_match(path) && source.contains(LOCALIZE_MARKER) {
                custom.i18n = Some(LocalizationOptions {
                    config: i18n.clone(),
                    plugin_creators: self.capabilities.locale_plugin_creators(),
                });
                custom.reasons |= ProcessReasons::I18N;
            }
        }

        if caller.optimize {
            // Angular packages give side-effect guarantees that make the
            // loose optimizations safe.
            let angular_package = ANGULAR_PACKAGE.is_match(path);
            custom.optimize = Some(OptimizeFlags {
                loose_enums: angular_package,
                pure_top_level: angular_package,
                // Side-effect free modules have no decorators with non-local effects.
                wrap_decorators: file.side_effect_free,
            });
            custom.reasons |= ProcessReasons::OPTIMIZE;
        }

        if let Some(instrument) = &caller.instrument_code {
            if !NODE_MODULES.is_match(path) && path.starts_with(&instrument.included_base_path) {
                custom.instrument_code = Some(InstrumentCodeOptions {
                    included_base_path: instrument.included_base_path.clone(),
                    input_source_map: file.input_source_map.clone(),
                });
                custom.reasons |= ProcessReasons::INSTRUMENT;
            }
        }

        if custom.should_process() {
            self.logger
                .debug(&format!("Processing {} ({:?})", path, custom.reasons));
        } else {
            self.logger.debug(&format!("Skipping {}", path));
        }

        Ok(custom)
    }

    /// Resolve custom options and the loader options for `file`.
    pub fn custom_options(
        &self,
        file: &FileContext,
        caller: &CallerOptions,
    ) -> Result<CustomOptionsResult, TransformConfigError> {
        let custom = self.resolve(file, caller)?;

        let key = cache_identifier(VERSION, &custom, &self.base_options, &caller.raw)
            .map_err(TransformConfigError::Serialize)?;
        self.logger.debug(&format!(
            "Cache key {:016x} for {}",
            key.fingerprint(),
            file.path
        ));

        let mut options = match serde_json::to_value(&self.base_options) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(err) => return Err(TransformConfigError::Serialize(err)),
        };
        for (name, value) in &caller.raw {
            options.insert(name.clone(), value.clone());
        }

        let loader = LoaderOptions {
            options,
            cache_identifier: key.into_string(),
            ignore: !custom.should_process(),
        };

        Ok(CustomOptionsResult { custom, loader })
    }

    /// Whether `file` has to go through Babel at all.
    pub fn requires_processing(
        &self,
        file: &FileContext,
        caller: &CallerOptions,
    ) -> Result<bool, TransformConfigError> {
        Ok(self.resolve(file, caller)?.should_process())
    }

    /// Resolve `file` and assemble its Babel configuration.
    ///
    /// The configuration is `None` for bypassed files, which must not reach
    /// Babel.
    pub fn transform_config(
        &self,
        file: &FileContext,
        caller: &CallerOptions,
        diagnostic_reporter: DiagnosticReporter,
    ) -> Result<(CustomOptionsResult, Option<TransformConfig>), TransformConfigError> {
        let result = self.custom_options(file, caller)?;
        if result.loader.is_bypassed() {
            return Ok((result, None));
        }

        let config = configure(
            TransformConfig::from_raw(&caller.raw)?,
            &result.custom,
            diagnostic_reporter,
        );
        Ok((result, Some(config)))
    }
}

impl Default for TransformSession {
    fn default() -> Self {
        Self::builtin(Arc::new(NullLogger))
    }
}

/// JSON document describing one file's resolution, as printed by the CLI
/// and returned by the Node binding.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub path: String,
    pub should_process: bool,
    pub custom: Value,
    pub loader: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl ResolutionReport {
    pub fn new(
        path: &str,
        result: &CustomOptionsResult,
        config: Option<&TransformConfig>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            path: path.to_string(),
            should_process: result.custom.should_process(),
            custom: serde_json::to_value(&result.custom)?,
            loader: result.loader.to_value(),
            config: config.map(TransformConfig::to_value).transpose()?,
        })
    }
}
