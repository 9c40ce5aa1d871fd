//! Transform Options
//!
//! Inputs supplied by the host bundler and the options resolved from them.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bitflags::bitflags;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::capabilities::{LinkerPluginFactory, LocalePluginCreators};
use super::error::TransformConfigError;

/// Caller options that are forwarded to the transform engine untouched.
///
/// Includes the caller's `plugins` and `presets`.
pub type RawOptions = Map<String, Value>;

/// Output language level of the compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ScriptTarget {
    ES3 = 0,
    ES5 = 1,
    ES2015 = 2,
    ES2016 = 3,
    ES2017 = 4,
    ES2018 = 5,
    ES2019 = 6,
    ES2020 = 7,
    ES2021 = 8,
    ES2022 = 9,
    ESNext = 99,
}

impl FromStr for ScriptTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let target = match s.to_ascii_lowercase().as_str() {
            "es3" => ScriptTarget::ES3,
            "es5" => ScriptTarget::ES5,
            "es2015" | "es6" => ScriptTarget::ES2015,
            "es2016" => ScriptTarget::ES2016,
            "es2017" => ScriptTarget::ES2017,
            "es2018" => ScriptTarget::ES2018,
            "es2019" => ScriptTarget::ES2019,
            "es2020" => ScriptTarget::ES2020,
            "es2021" => ScriptTarget::ES2021,
            "es2022" => ScriptTarget::ES2022,
            "esnext" => ScriptTarget::ESNext,
            other => return Err(format!("unknown script target '{}'", other)),
        };
        Ok(target)
    }
}

impl TryFrom<String> for ScriptTarget {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ScriptTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptTarget::ES3 => "es3",
            ScriptTarget::ES5 => "es5",
            ScriptTarget::ES2015 => "es2015",
            ScriptTarget::ES2016 => "es2016",
            ScriptTarget::ES2017 => "es2017",
            ScriptTarget::ES2018 => "es2018",
            ScriptTarget::ES2019 => "es2019",
            ScriptTarget::ES2020 => "es2020",
            ScriptTarget::ES2021 => "es2021",
            ScriptTarget::ES2022 => "es2022",
            ScriptTarget::ESNext => "esnext",
        };
        f.write_str(name)
    }
}

/// The file being transformed, as seen by the host bundler.
#[derive(Debug, Clone, Default)]
pub struct FileContext {
    /// Absolute resource path.
    pub path: String,
    /// Source text after any earlier loaders ran.
    pub source: String,
    /// Whether the bundler marked the compiled module as side-effect free.
    pub side_effect_free: bool,
    /// Source map handed over by the previous loader.
    pub input_source_map: Option<Value>,
}

impl FileContext {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_side_effect_free(mut self, side_effect_free: bool) -> Self {
        self.side_effect_free = side_effect_free;
        self
    }

    pub fn with_input_source_map(mut self, map: Value) -> Self {
        self.input_source_map = Some(map);
        self
    }
}

/// A plugin or preset entry in Babel's configuration format.
///
/// Either a bare name or a `[name, options]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginDescriptor {
    Name(String),
    WithOptions(String, Value),
}

impl PluginDescriptor {
    pub fn name(&self) -> &str {
        match self {
            PluginDescriptor::Name(name) | PluginDescriptor::WithOptions(name, _) => name,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            PluginDescriptor::Name(_) => None,
            PluginDescriptor::WithOptions(_, options) => Some(options),
        }
    }
}

/// Locale inlining parameters. Opaque to this crate; passed on to the
/// application preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizationConfig(pub IndexMap<String, Value>);

/// Coverage instrumentation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentCodeConfig {
    /// Only files below this path are instrumented.
    pub included_base_path: String,
}

/// Options supplied by the caller of the loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_target: Option<ScriptTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<LocalizationConfig>,
    #[serde(default)]
    pub optimize: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_code: Option<InstrumentCodeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_browsers: Option<Vec<String>>,
    #[serde(flatten)]
    pub raw: RawOptions,
}

impl CallerOptions {
    /// Load caller options from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let options = Self::from_json(&content)?;
        Ok(options)
    }

    pub fn from_json(json: &str) -> Result<Self, TransformConfigError> {
        serde_json::from_str(json).map_err(TransformConfigError::InvalidOptions)
    }

    /// Whether the caller explicitly added Babel plugins.
    pub fn has_plugins(&self) -> bool {
        self.raw
            .get("plugins")
            .and_then(Value::as_array)
            .is_some_and(|plugins| !plugins.is_empty())
    }

    pub fn with_script_target(mut self, target: ScriptTarget) -> Self {
        self.script_target = Some(target);
        self
    }

    pub fn with_aot(mut self, aot: bool) -> Self {
        self.aot = Some(aot);
        self
    }

    pub fn with_i18n(mut self, i18n: LocalizationConfig) -> Self {
        self.i18n = Some(i18n);
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_instrument_code(mut self, included_base_path: impl Into<String>) -> Self {
        self.instrument_code = Some(InstrumentCodeConfig {
            included_base_path: included_base_path.into(),
        });
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<PluginDescriptor>) -> Self {
        let plugins = plugins
            .into_iter()
            .map(|plugin| match plugin {
                PluginDescriptor::Name(name) => Value::String(name),
                PluginDescriptor::WithOptions(name, options) => {
                    Value::Array(vec![Value::String(name), options])
                }
            })
            .collect();
        self.raw.insert("plugins".to_string(), Value::Array(plugins));
        self
    }
}

/// Per-file optimization switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeFlags {
    /// Enum IIFEs may be wrapped without preserving evaluation order.
    pub loose_enums: bool,
    /// Top-level calls may be annotated as pure.
    pub pure_top_level: bool,
    /// Decorator calls may be wrapped for tree shaking.
    pub wrap_decorators: bool,
}

/// Partial-declaration linking settings.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkerOptions {
    pub should_link: bool,
    pub jit_mode: bool,
    #[serde(skip)]
    pub linker_plugin_creator: Arc<dyn LinkerPluginFactory>,
}

impl fmt::Debug for LinkerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkerOptions")
            .field("should_link", &self.should_link)
            .field("jit_mode", &self.jit_mode)
            .finish_non_exhaustive()
    }
}

/// Locale inlining settings with the plugin creators attached, when they
/// could be loaded.
#[derive(Clone, Serialize)]
pub struct LocalizationOptions {
    #[serde(flatten)]
    pub config: LocalizationConfig,
    #[serde(skip)]
    pub plugin_creators: Option<Arc<dyn LocalePluginCreators>>,
}

impl fmt::Debug for LocalizationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizationOptions")
            .field("config", &self.config)
            .field("plugin_creators", &self.plugin_creators.is_some())
            .finish()
    }
}

/// Coverage instrumentation settings for a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentCodeOptions {
    pub included_base_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_source_map: Option<Value>,
}

bitflags! {
    /// Why a file has to go through the transform engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProcessReasons: u8 {
        const PLUGINS = 1 << 0;
        const LINKING = 1 << 1;
        const DOWNLEVEL = 1 << 2;
        const I18N = 1 << 3;
        const OPTIMIZE = 1 << 4;
        const INSTRUMENT = 1 << 5;
    }
}

impl Default for ProcessReasons {
    fn default() -> Self {
        Self::empty()
    }
}

/// Options resolved for one file. Handed to the application preset and
/// recorded in the cache identifier.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub force_async_transformation: bool,
    #[serde(rename = "forceES5")]
    pub force_es5: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angular_linker: Option<LinkerOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i18n: Option<LocalizationOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<OptimizeFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument_code: Option<InstrumentCodeOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_browsers: Option<Vec<String>>,
    #[serde(skip)]
    pub reasons: ProcessReasons,
}

impl ResolvedOptions {
    /// Whether the file has to be processed at all.
    pub fn should_process(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn needs_linking(&self) -> bool {
        self.angular_linker.as_ref().is_some_and(|l| l.should_link)
    }
}

/// Static options applied to every Babel invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseOptions {
    pub babelrc: bool,
    pub config_file: bool,
    pub compact: bool,
    pub cache_compression: bool,
    pub source_type: String,
    pub input_source_map: bool,
}

impl Default for BaseOptions {
    fn default() -> Self {
        Self {
            babelrc: false,
            config_file: false,
            compact: false,
            cache_compression: false,
            source_type: "unambiguous".to_string(),
            input_source_map: false,
        }
    }
}
