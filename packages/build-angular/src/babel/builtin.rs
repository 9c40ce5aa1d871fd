//! Built-in Capabilities
//!
//! Capability implementations that need no external toolchain. Used by the
//! CLI and the Node binding when the host does not supply its own loader.

use std::sync::Arc;

use serde_json::json;

use super::capabilities::{
    CapabilityError, CapabilityLoader, LinkerPluginFactory, LinkingDetector, LocalePluginCreators,
};
use super::options::PluginDescriptor;

/// Partial declaration functions emitted by partial compilation.
pub const PARTIAL_DECLARATIONS: &[&str] = &[
    "ɵɵngDeclareClassMetadata",
    "ɵɵngDeclareComponent",
    "ɵɵngDeclareDirective",
    "ɵɵngDeclareFactory",
    "ɵɵngDeclareInjectable",
    "ɵɵngDeclareInjector",
    "ɵɵngDeclareNgModule",
    "ɵɵngDeclarePipe",
];

/// Detects linking needs by scanning for partial declaration calls.
#[derive(Debug, Default)]
pub struct DeclarationScanner;

impl LinkingDetector for DeclarationScanner {
    fn needs_linking(&self, _path: &str, source: &str) -> bool {
        PARTIAL_DECLARATIONS.iter().any(|name| source.contains(name))
    }
}

#[derive(Debug, Default)]
pub struct BuiltinLinkerPluginFactory;

impl LinkerPluginFactory for BuiltinLinkerPluginFactory {
    fn create_linker_plugin(&self, jit_mode: bool) -> PluginDescriptor {
        PluginDescriptor::WithOptions(
            "@angular/compiler-cli/linker/babel".to_string(),
            json!({ "linkerJitMode": jit_mode }),
        )
    }
}

#[derive(Debug, Default)]
pub struct BuiltinLocalePluginCreators;

impl LocalePluginCreators for BuiltinLocalePluginCreators {
    fn create_translate_plugin(&self, es5: bool) -> PluginDescriptor {
        let name = if es5 {
            "makeEs5TranslatePlugin"
        } else {
            "makeEs2015TranslatePlugin"
        };
        PluginDescriptor::Name(format!("@angular/localize/tools#{}", name))
    }

    fn create_locale_plugin(&self, locale: &str) -> PluginDescriptor {
        PluginDescriptor::WithOptions(
            "@angular/localize/tools#makeLocalePlugin".to_string(),
            json!({ "locale": locale }),
        )
    }
}

/// Loader that hands out the built-in capabilities. Never fails.
#[derive(Debug, Default)]
pub struct BuiltinCapabilityLoader;

impl CapabilityLoader for BuiltinCapabilityLoader {
    fn load_linking_detector(&self) -> Result<Arc<dyn LinkingDetector>, CapabilityError> {
        Ok(Arc::new(DeclarationScanner))
    }

    fn load_linker_plugin_factory(&self) -> Result<Arc<dyn LinkerPluginFactory>, CapabilityError> {
        Ok(Arc::new(BuiltinLinkerPluginFactory))
    }

    fn load_locale_plugin_creators(
        &self,
    ) -> Result<Arc<dyn LocalePluginCreators>, CapabilityError> {
        Ok(Arc::new(BuiltinLocalePluginCreators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_detects_partial_declarations() {
        let scanner = DeclarationScanner;
        let source = "static ɵcmp = i0.ɵɵngDeclareComponent({ minVersion: \"14.0.0\" });";
        assert!(scanner.needs_linking("/node_modules/lib/fesm2020/lib.mjs", source));
    }

    #[test]
    fn scanner_ignores_fully_compiled_code() {
        let scanner = DeclarationScanner;
        let source = "static ɵcmp = i0.ɵɵdefineComponent({ selectors: [[\"app\"]] });";
        assert!(!scanner.needs_linking("/node_modules/lib/fesm2020/lib.mjs", source));
    }

    #[test]
    fn linker_plugin_carries_jit_mode() {
        let plugin = BuiltinLinkerPluginFactory.create_linker_plugin(true);
        assert_eq!(plugin.name(), "@angular/compiler-cli/linker/babel");
        assert_eq!(plugin.options(), Some(&json!({ "linkerJitMode": true })));
    }

    #[test]
    fn locale_creators_pick_translate_plugin_by_target() {
        let creators = BuiltinLocalePluginCreators;
        assert!(creators.create_translate_plugin(true).name().ends_with("makeEs5TranslatePlugin"));
        assert!(creators
            .create_translate_plugin(false)
            .name()
            .ends_with("makeEs2015TranslatePlugin"));
        assert_eq!(
            creators.create_locale_plugin("fr").options(),
            Some(&json!({ "locale": "fr" }))
        );
    }

    #[test]
    fn builtin_loader_never_fails() {
        let loader = BuiltinCapabilityLoader;
        assert!(loader.load_linking_detector().is_ok());
        assert!(loader.load_linker_plugin_factory().is_ok());
        assert!(loader.load_locale_plugin_creators().is_ok());
    }
}
