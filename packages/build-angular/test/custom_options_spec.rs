mod support;

use std::sync::Arc;

use angular_build::babel::{
    CallerOptions, FileContext, LocalizationConfig, PluginDescriptor, ProcessReasons,
    ScriptTarget,
};
use indexmap::IndexMap;
use serde_json::json;

use support::{session, CountingLoader, PARTIAL_COMPONENT};

const APP_FILE: &str = "/project/src/app/app.component.ts";
const LIB_FILE: &str = "/project/node_modules/some-lib/fesm2020/some-lib.mjs";
const ANGULAR_FILE: &str = "/project/node_modules/@angular/common/fesm2020/common.mjs";

fn i18n_config() -> LocalizationConfig {
    let mut config = IndexMap::new();
    config.insert("locale".to_string(), json!("fr"));
    config.insert("missingTranslation".to_string(), json!("warning"));
    LocalizationConfig(config)
}

mod bypass {
    use super::*;

    #[test]
    fn should_skip_files_without_any_transform() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let file = FileContext::new(LIB_FILE, "export const x = 1;");

        let result = session
            .custom_options(&file, &CallerOptions::default())
            .unwrap();

        assert!(!result.custom.should_process());
        assert!(result.loader.is_bypassed());
        assert_eq!(result.loader.to_value()["ignore"], json!(true));
        assert!(!session
            .requires_processing(&file, &CallerOptions::default())
            .unwrap());
    }

    #[test]
    fn should_process_when_caller_adds_plugins() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let caller =
            CallerOptions::default().with_plugins(vec![PluginDescriptor::Name("my-plugin".into())]);

        let result = session
            .custom_options(&FileContext::new(LIB_FILE, "export {}"), &caller)
            .unwrap();

        assert_eq!(result.custom.reasons, ProcessReasons::PLUGINS);
        assert!(!result.loader.is_bypassed());
        assert!(result.loader.to_value().get("ignore").is_none());
    }

    #[test]
    fn should_merge_base_and_raw_options_into_loader_options() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let caller = CallerOptions::from_json(r#"{ "compact": true, "sourceMaps": "inline" }"#)
            .unwrap();

        let result = session
            .custom_options(&FileContext::new(LIB_FILE, "export {}"), &caller)
            .unwrap();
        let loader_options = result.loader.to_value();

        assert_eq!(loader_options["babelrc"], json!(false));
        assert_eq!(loader_options["sourceType"], json!("unambiguous"));
        assert_eq!(loader_options["compact"], json!(true));
        assert_eq!(loader_options["sourceMaps"], json!("inline"));
        assert!(loader_options["cacheIdentifier"]
            .as_str()
            .unwrap()
            .contains("\"buildAngular\""));
    }
}

mod linking {
    use super::*;

    #[test]
    fn should_link_partial_declarations_in_jit_mode_by_default() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        let custom = session
            .resolve(
                &FileContext::new(LIB_FILE, PARTIAL_COMPONENT),
                &CallerOptions::default(),
            )
            .unwrap();

        let linker = custom.angular_linker.as_ref().unwrap();
        assert!(linker.should_link);
        assert!(linker.jit_mode);
        assert!(custom.reasons.contains(ProcessReasons::LINKING));
        assert_eq!(loader.factory_loads(), 1);
    }

    #[test]
    fn should_disable_jit_mode_for_aot_builds() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        let custom = session
            .resolve(
                &FileContext::new(LIB_FILE, PARTIAL_COMPONENT),
                &CallerOptions::default().with_aot(true),
            )
            .unwrap();

        assert!(!custom.angular_linker.unwrap().jit_mode);
    }

    #[test]
    fn should_not_consult_the_detector_for_typescript_or_core_files() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        for path in [
            APP_FILE,
            "/project/node_modules/@angular/core/fesm2020/core.mjs",
        ] {
            let custom = session
                .resolve(&FileContext::new(path, PARTIAL_COMPONENT), &CallerOptions::default())
                .unwrap();
            assert!(custom.angular_linker.is_none());
        }

        assert_eq!(loader.detector_loads(), 0);
        assert_eq!(loader.detector_calls(), 0);
        assert_eq!(loader.factory_loads(), 0);
    }

    #[test]
    fn should_not_load_the_factory_when_nothing_needs_linking() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        session
            .resolve(&FileContext::new(LIB_FILE, "export {}"), &CallerOptions::default())
            .unwrap();

        assert_eq!(loader.detector_loads(), 1);
        assert_eq!(loader.detector_calls(), 1);
        assert_eq!(loader.factory_loads(), 0);
    }
}

mod downleveling {
    use super::*;

    fn resolve(path: &str, source: &str, target: ScriptTarget) -> (bool, bool, bool) {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let custom = session
            .resolve(
                &FileContext::new(path, source),
                &CallerOptions::default().with_script_target(target),
            )
            .unwrap();
        (
            custom.force_es5,
            custom.force_async_transformation,
            custom.should_process(),
        )
    }

    #[test]
    fn should_force_es5_below_es2015() {
        assert_eq!(
            resolve(APP_FILE, "async function f() {}", ScriptTarget::ES5),
            (true, false, true)
        );
    }

    #[test]
    fn should_force_async_transformation_for_es2017_application_code() {
        assert_eq!(
            resolve(APP_FILE, "async function f() {}", ScriptTarget::ES2017),
            (false, true, true)
        );
    }

    #[test]
    fn should_leave_es2015_typescript_alone() {
        assert_eq!(
            resolve(APP_FILE, "async function f() {}", ScriptTarget::ES2015),
            (false, false, false)
        );
    }

    #[test]
    fn should_force_async_transformation_for_javascript_at_any_es2015_plus_target() {
        for path in ["/p/node_modules/lib/index.js", "/p/lib/index.mjs", "/p/lib/index.cjs"] {
            assert_eq!(
                resolve(path, "export async function f() {}", ScriptTarget::ES2015),
                (false, true, true),
                "{}",
                path
            );
        }
    }

    #[test]
    fn should_not_force_async_transformation_without_async_in_source() {
        assert_eq!(
            resolve(LIB_FILE, "export function f() {}", ScriptTarget::ES2017),
            (false, false, false)
        );
    }

    #[test]
    fn should_skip_pre_downleveled_package_directories() {
        for path in [
            "/p/node_modules/lib/esm2015/index.js",
            "/p/node_modules/lib/fesm2015/lib.js",
            "C:\\p\\node_modules\\lib\\_esm2015\\index.js",
        ] {
            assert_eq!(
                resolve(path, "export async function f() {}", ScriptTarget::ES2017),
                (false, false, false),
                "{}",
                path
            );
        }
    }

    #[test]
    fn should_not_downlevel_without_a_target() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let custom = session
            .resolve(
                &FileContext::new(LIB_FILE, "async function f() {}"),
                &CallerOptions::default(),
            )
            .unwrap();
        assert!(!custom.force_es5);
        assert!(!custom.force_async_transformation);
    }
}

mod localization {
    use super::*;

    #[test]
    fn should_attach_plugin_creators_for_localized_sources() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        let custom = session
            .resolve(
                &FileContext::new(LIB_FILE, "const title = $localize`Hello`;"),
                &CallerOptions::default().with_i18n(i18n_config()),
            )
            .unwrap();

        let i18n = custom.i18n.as_ref().unwrap();
        assert!(i18n.plugin_creators.is_some());
        assert_eq!(i18n.config, i18n_config());
        assert!(custom.reasons.contains(ProcessReasons::I18N));
        assert_eq!(loader.locale_loads(), 1);
    }

    #[test]
    fn should_ignore_sources_without_localize_calls() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        let custom = session
            .resolve(
                &FileContext::new(LIB_FILE, "const title = 'Hello';"),
                &CallerOptions::default().with_i18n(i18n_config()),
            )
            .unwrap();

        assert!(custom.i18n.is_none());
        assert!(!custom.should_process());
        assert_eq!(loader.locale_loads(), 0);
    }

    #[test]
    fn should_ignore_the_localize_and_compiler_packages() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        for path in [
            "/p/node_modules/@angular/localize/fesm2020/localize.mjs",
            "/p/node_modules/@angular/compiler/fesm2020/compiler.mjs",
        ] {
            let custom = session
                .resolve(
                    &FileContext::new(path, "$localize`x`"),
                    &CallerOptions::default().with_i18n(i18n_config()),
                )
                .unwrap();
            assert!(custom.i18n.is_none(), "{}", path);
        }
    }

    #[test]
    fn should_degrade_when_plugin_creators_cannot_load() {
        let loader = Arc::new(CountingLoader::new().failing_locale_loads(usize::MAX));
        let session = session(&loader);

        let custom = session
            .resolve(
                &FileContext::new(LIB_FILE, "$localize`Hello`"),
                &CallerOptions::default().with_i18n(i18n_config()),
            )
            .unwrap();

        let i18n = custom.i18n.as_ref().unwrap();
        assert!(i18n.plugin_creators.is_none());
        assert!(custom.should_process());
    }
}

mod optimization {
    use super::*;

    #[test]
    fn should_enable_loose_optimizations_for_angular_packages() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        let custom = session
            .resolve(
                &FileContext::new(ANGULAR_FILE, "export {}"),
                &CallerOptions::default().with_optimize(true),
            )
            .unwrap();

        let optimize = custom.optimize.unwrap();
        assert!(optimize.loose_enums);
        assert!(optimize.pure_top_level);
        assert!(!optimize.wrap_decorators);
        assert!(custom.reasons.contains(ProcessReasons::OPTIMIZE));
    }

    #[test]
    fn should_keep_safe_optimizations_for_other_code() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        for side_effect_free in [false, true] {
            let custom = session
                .resolve(
                    &FileContext::new(LIB_FILE, "export {}").with_side_effect_free(side_effect_free),
                    &CallerOptions::default().with_optimize(true),
                )
                .unwrap();

            let optimize = custom.optimize.unwrap();
            assert!(!optimize.loose_enums);
            assert!(!optimize.pure_top_level);
            assert_eq!(optimize.wrap_decorators, side_effect_free);
        }
    }

    #[test]
    fn should_not_optimize_unless_requested() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);

        let custom = session
            .resolve(&FileContext::new(ANGULAR_FILE, "export {}"), &CallerOptions::default())
            .unwrap();
        assert!(custom.optimize.is_none());
    }
}

mod instrumentation {
    use super::*;

    #[test]
    fn should_instrument_files_below_the_included_base_path() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let map = json!({ "version": 3, "mappings": "" });

        let custom = session
            .resolve(
                &FileContext::new("/project/src/app/app.component.js", "export {}")
                    .with_input_source_map(map.clone()),
                &CallerOptions::default().with_instrument_code("/project/src"),
            )
            .unwrap();

        let instrument = custom.instrument_code.unwrap();
        assert_eq!(instrument.included_base_path, "/project/src");
        assert_eq!(instrument.input_source_map, Some(map));
        assert!(custom.reasons.contains(ProcessReasons::INSTRUMENT));
    }

    #[test]
    fn should_not_instrument_dependencies_or_other_paths() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let caller = CallerOptions::default().with_instrument_code("/project");

        for path in ["/project/node_modules/lib/index.js", "/elsewhere/index.js"] {
            let custom = session
                .resolve(&FileContext::new(path, "export {}"), &caller)
                .unwrap();
            assert!(custom.instrument_code.is_none(), "{}", path);
            assert!(!custom.should_process(), "{}", path);
        }
    }
}

mod cache_identifier {
    use super::*;

    #[test]
    fn should_be_stable_for_identical_configuration() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let file = FileContext::new(ANGULAR_FILE, "export {}");

        let a = CallerOptions::from_json(r#"{ "optimize": true, "a": 1, "b": 2 }"#).unwrap();
        let b = CallerOptions::from_json(r#"{ "b": 2, "optimize": true, "a": 1 }"#).unwrap();

        let first = session.custom_options(&file, &a).unwrap();
        let second = session.custom_options(&file, &b).unwrap();
        assert_eq!(first.loader.cache_identifier, second.loader.cache_identifier);
    }

    #[test]
    fn should_change_with_resolved_options() {
        let loader = Arc::new(CountingLoader::new());
        let session = session(&loader);
        let caller = CallerOptions::default().with_optimize(true);

        let angular = session
            .custom_options(&FileContext::new(ANGULAR_FILE, "export {}"), &caller)
            .unwrap();
        let other = session
            .custom_options(&FileContext::new(LIB_FILE, "export {}"), &caller)
            .unwrap();
        assert_ne!(angular.loader.cache_identifier, other.loader.cache_identifier);
    }
}
