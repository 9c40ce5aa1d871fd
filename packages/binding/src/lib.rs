#![deny(clippy::all)]

use std::sync::Arc;

use angular_build::babel::{
    CallerOptions, DiagnosticReporter, FileContext, LoggerDiagnosticsHost, ResolutionReport,
    TransformSession as Session,
};
use angular_build::logging::{ConsoleLogger, LogLevel, Logger};
use napi::{Error, Result, Status};
use napi_derive::napi;

fn to_napi_error(err: impl std::fmt::Display) -> Error {
    Error::new(Status::GenericFailure, err.to_string())
}

#[napi]
pub struct TransformSession {
    inner: Session,
    reporter: DiagnosticReporter,
}

#[napi]
impl TransformSession {
    #[napi(constructor)]
    pub fn new(log_level: Option<String>) -> Result<Self> {
        let level = match log_level {
            Some(level) => level.parse::<LogLevel>().map_err(to_napi_error)?,
            None => LogLevel::Warn,
        };
        let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new(level));
        let host = Arc::new(LoggerDiagnosticsHost::new(logger.clone()));

        Ok(TransformSession {
            inner: Session::builtin(logger),
            reporter: DiagnosticReporter::new(host),
        })
    }

    /// Resolve the loader configuration for one file, as JSON.
    #[napi]
    pub fn custom_options(
        &self,
        path: String,
        source: String,
        options_json: String,
        side_effect_free: Option<bool>,
    ) -> Result<String> {
        let caller = CallerOptions::from_json(&options_json).map_err(to_napi_error)?;
        let file = FileContext::new(path, source)
            .with_side_effect_free(side_effect_free.unwrap_or(false));

        let (result, config) = self
            .inner
            .transform_config(&file, &caller, self.reporter.clone())
            .map_err(to_napi_error)?;

        let report =
            ResolutionReport::new(&file.path, &result, config.as_ref()).map_err(to_napi_error)?;
        serde_json::to_string(&report).map_err(to_napi_error)
    }

    /// Whether the file needs Babel at all.
    #[napi]
    pub fn requires_processing(
        &self,
        path: String,
        source: String,
        options_json: String,
    ) -> Result<bool> {
        let caller = CallerOptions::from_json(&options_json).map_err(to_napi_error)?;
        self.inner
            .requires_processing(&FileContext::new(path, source), &caller)
            .map_err(to_napi_error)
    }
}

#[napi]
pub fn version() -> String {
    angular_build::version::version_string()
}
