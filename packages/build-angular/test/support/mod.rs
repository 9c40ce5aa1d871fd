#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use angular_build::babel::builtin::{BuiltinLinkerPluginFactory, BuiltinLocalePluginCreators};
use angular_build::babel::{
    CapabilityError, CapabilityLoader, CapabilityName, DiagnosticsHost, LinkerPluginFactory,
    LinkingDetector, LocalePluginCreators, TransformSession,
};
use angular_build::logging::NullLogger;

pub const PARTIAL_COMPONENT: &str =
    "import * as i0 from '@angular/core';\nclass Cmp {}\nCmp.ɵcmp = i0.ɵɵngDeclareComponent({ minVersion: '14.0.0', type: Cmp });\n";

pub struct CountingDetector {
    calls: Arc<AtomicUsize>,
}

impl LinkingDetector for CountingDetector {
    fn needs_linking(&self, _path: &str, source: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        source.contains("ɵɵngDeclare")
    }
}

/// Capability loader that counts loads and can be told to fail.
#[derive(Default)]
pub struct CountingLoader {
    pub detector_loads: AtomicUsize,
    pub factory_loads: AtomicUsize,
    pub locale_loads: AtomicUsize,
    pub detector_calls: Arc<AtomicUsize>,
    fail_detector: bool,
    fail_factory: bool,
    locale_failures: AtomicUsize,
    load_delay: Duration,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_detector(mut self) -> Self {
        self.fail_detector = true;
        self
    }

    pub fn failing_factory(mut self) -> Self {
        self.fail_factory = true;
        self
    }

    /// Fail the first `count` locale plugin loads.
    pub fn failing_locale_loads(self, count: usize) -> Self {
        self.locale_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn detector_loads(&self) -> usize {
        self.detector_loads.load(Ordering::SeqCst)
    }

    pub fn factory_loads(&self) -> usize {
        self.factory_loads.load(Ordering::SeqCst)
    }

    pub fn locale_loads(&self) -> usize {
        self.locale_loads.load(Ordering::SeqCst)
    }

    pub fn detector_calls(&self) -> usize {
        self.detector_calls.load(Ordering::SeqCst)
    }

    fn simulate_load(&self) {
        if !self.load_delay.is_zero() {
            thread::sleep(self.load_delay);
        }
    }
}

impl CapabilityLoader for CountingLoader {
    fn load_linking_detector(&self) -> Result<Arc<dyn LinkingDetector>, CapabilityError> {
        self.detector_loads.fetch_add(1, Ordering::SeqCst);
        self.simulate_load();
        if self.fail_detector {
            return Err(CapabilityError::new(
                CapabilityName::LinkingDetector,
                "Cannot find module '@angular/compiler-cli/linker'",
            ));
        }
        Ok(Arc::new(CountingDetector {
            calls: self.detector_calls.clone(),
        }))
    }

    fn load_linker_plugin_factory(&self) -> Result<Arc<dyn LinkerPluginFactory>, CapabilityError> {
        self.factory_loads.fetch_add(1, Ordering::SeqCst);
        self.simulate_load();
        if self.fail_factory {
            return Err(CapabilityError::new(
                CapabilityName::LinkerPluginFactory,
                "Cannot find module '@angular/compiler-cli/linker/babel'",
            ));
        }
        Ok(Arc::new(BuiltinLinkerPluginFactory))
    }

    fn load_locale_plugin_creators(
        &self,
    ) -> Result<Arc<dyn LocalePluginCreators>, CapabilityError> {
        self.locale_loads.fetch_add(1, Ordering::SeqCst);
        self.simulate_load();
        let remaining = self.locale_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.locale_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CapabilityError::new(
                CapabilityName::LocalePluginCreators,
                "Cannot find module '@angular/localize/tools'",
            ));
        }
        Ok(Arc::new(BuiltinLocalePluginCreators))
    }
}

pub fn session(loader: &Arc<CountingLoader>) -> TransformSession {
    TransformSession::new(loader.clone(), Arc::new(NullLogger))
}

/// Diagnostics host that records what it receives.
#[derive(Default)]
pub struct RecordingHost {
    pub errors: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl DiagnosticsHost for RecordingHost {
    fn emit_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn emit_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}
