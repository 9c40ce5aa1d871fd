//! Transform Stage Assembly
//!
//! Extends the caller's Babel configuration with the optimization plugins a
//! file needs and the Angular application preset.

use serde_json::{json, Value};
use smallvec::SmallVec;

use super::diagnostics::DiagnosticReporter;
use super::error::TransformConfigError;
use super::options::{OptimizeFlags, PluginDescriptor, RawOptions, ResolvedOptions};

/// A plugin in the transform pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Annotates top-level calls as pure.
    PureToplevelFunctions,
    /// Removes Angular class metadata calls.
    ElideAngularMetadata,
    /// Wraps TypeScript enum IIFEs.
    AdjustTypescriptEnums { loose: bool },
    /// Wraps classes with static members and decorators.
    AdjustStaticClassMembers { wrap_decorators: bool },
    /// A plugin supplied by the caller.
    External(PluginDescriptor),
}

impl Stage {
    pub fn descriptor(&self) -> PluginDescriptor {
        match self {
            Stage::PureToplevelFunctions => PluginDescriptor::Name("pure-toplevel-functions".into()),
            Stage::ElideAngularMetadata => PluginDescriptor::Name("elide-angular-metadata".into()),
            Stage::AdjustTypescriptEnums { loose } => PluginDescriptor::WithOptions(
                "adjust-typescript-enums".into(),
                json!({ "loose": loose }),
            ),
            Stage::AdjustStaticClassMembers { wrap_decorators } => PluginDescriptor::WithOptions(
                "adjust-static-class-members".into(),
                json!({ "wrapDecorators": wrap_decorators }),
            ),
            Stage::External(descriptor) => descriptor.clone(),
        }
    }
}

type StagePredicate = fn(&OptimizeFlags) -> bool;
type StageBuilder = fn(&OptimizeFlags) -> Stage;

fn always(_: &OptimizeFlags) -> bool {
    true
}

fn pure_top_level(flags: &OptimizeFlags) -> bool {
    flags.pure_top_level
}

fn pure_toplevel_functions(_: &OptimizeFlags) -> Stage {
    Stage::PureToplevelFunctions
}

fn elide_angular_metadata(_: &OptimizeFlags) -> Stage {
    Stage::ElideAngularMetadata
}

fn adjust_typescript_enums(flags: &OptimizeFlags) -> Stage {
    Stage::AdjustTypescriptEnums {
        loose: flags.loose_enums,
    }
}

fn adjust_static_class_members(flags: &OptimizeFlags) -> Stage {
    Stage::AdjustStaticClassMembers {
        wrap_decorators: flags.wrap_decorators,
    }
}

// Order matters: metadata has to be elided before static members are
// wrapped.
const OPTIMIZATION_STAGES: [(StagePredicate, StageBuilder); 4] = [
    (pure_top_level, pure_toplevel_functions),
    (always, elide_angular_metadata),
    (always, adjust_typescript_enums),
    (always, adjust_static_class_members),
];

/// Optimization plugins enabled by `flags`, in pipeline order.
pub fn optimization_stages(flags: &OptimizeFlags) -> SmallVec<[Stage; 4]> {
    OPTIMIZATION_STAGES
        .iter()
        .filter(|(enabled, _)| enabled(flags))
        .map(|(_, build)| build(flags))
        .collect()
}

/// The Angular application preset and the options it runs with.
#[derive(Debug, Clone)]
pub struct ApplicationPreset {
    pub options: ResolvedOptions,
    pub diagnostic_reporter: DiagnosticReporter,
}

impl ApplicationPreset {
    pub const NAME: &'static str = "@angular-devkit/build-angular/babel/presets/application";

    /// Linker plugin the preset adds for files with partial declarations.
    pub fn linker_plugin(&self) -> Option<PluginDescriptor> {
        self.options
            .angular_linker
            .as_ref()
            .filter(|linker| linker.should_link)
            .map(|linker| linker.linker_plugin_creator.create_linker_plugin(linker.jit_mode))
    }

    /// Translation and locale plugins, when the creators could be loaded.
    pub fn locale_plugins(&self) -> Vec<PluginDescriptor> {
        let Some(i18n) = &self.options.i18n else {
            return Vec::new();
        };
        let Some(creators) = &i18n.plugin_creators else {
            return Vec::new();
        };

        let mut plugins = vec![creators.create_translate_plugin(self.options.force_es5)];
        if let Some(locale) = i18n.config.0.get("locale").and_then(Value::as_str) {
            plugins.push(creators.create_locale_plugin(locale));
        }
        plugins
    }

    pub fn descriptor(&self) -> Result<PluginDescriptor, serde_json::Error> {
        let mut options = serde_json::to_value(&self.options)?;
        if let Value::Object(map) = &mut options {
            let plugins: Vec<PluginDescriptor> = self
                .linker_plugin()
                .into_iter()
                .chain(self.locale_plugins())
                .collect();
            map.insert("plugins".to_string(), serde_json::to_value(plugins)?);
        }
        Ok(PluginDescriptor::WithOptions(Self::NAME.to_string(), options))
    }
}

/// A preset in the transform pipeline.
#[derive(Debug, Clone)]
pub enum PresetEntry {
    External(PluginDescriptor),
    Application(Box<ApplicationPreset>),
}

impl PresetEntry {
    pub fn descriptor(&self) -> Result<PluginDescriptor, serde_json::Error> {
        match self {
            PresetEntry::External(descriptor) => Ok(descriptor.clone()),
            PresetEntry::Application(preset) => preset.descriptor(),
        }
    }
}

/// Plugin and preset lists of one Babel invocation.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub plugins: Vec<Stage>,
    pub presets: Vec<PresetEntry>,
    pub input_source_map: Option<Value>,
}

impl TransformConfig {
    /// Start from the caller's `plugins`, `presets` and `inputSourceMap`.
    pub fn from_raw(raw: &RawOptions) -> Result<Self, TransformConfigError> {
        let plugins: Vec<PluginDescriptor> = parse_list(raw, "plugins")?;
        let presets: Vec<PluginDescriptor> = parse_list(raw, "presets")?;

        Ok(Self {
            plugins: plugins.into_iter().map(Stage::External).collect(),
            presets: presets.into_iter().map(PresetEntry::External).collect(),
            input_source_map: raw.get("inputSourceMap").cloned(),
        })
    }

    pub fn application_preset(&self) -> Option<&ApplicationPreset> {
        self.presets.iter().find_map(|preset| match preset {
            PresetEntry::Application(preset) => Some(preset.as_ref()),
            PresetEntry::External(_) => None,
        })
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let plugins: Vec<PluginDescriptor> = self.plugins.iter().map(Stage::descriptor).collect();
        let presets = self
            .presets
            .iter()
            .map(PresetEntry::descriptor)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(json!({
            "plugins": plugins,
            "presets": presets,
            "inputSourceMap": self.input_source_map.clone().unwrap_or(Value::Bool(false)),
        }))
    }
}

fn parse_list(raw: &RawOptions, key: &str) -> Result<Vec<PluginDescriptor>, TransformConfigError> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(TransformConfigError::InvalidOptions)
        }
    }
}

/// Append the stages `custom` enables and the application preset.
///
/// Optimization plugins run after the caller's plugins; the application
/// preset runs after the caller's presets. An unset `inputSourceMap` becomes
/// `false` so Babel does not go looking for source maps itself.
pub fn configure(
    mut config: TransformConfig,
    custom: &ResolvedOptions,
    diagnostic_reporter: DiagnosticReporter,
) -> TransformConfig {
    if let Some(optimize) = &custom.optimize {
        config.plugins.extend(optimization_stages(optimize));
    }

    config.input_source_map.get_or_insert(Value::Bool(false));

    config
        .presets
        .push(PresetEntry::Application(Box::new(ApplicationPreset {
            options: custom.clone(),
            diagnostic_reporter,
        })));

    config
}
