/**
 * Angular Build - ng-babel-config
 *
 * Prints the Babel configuration the Angular loader would use per file
 */
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Command as ProcessCommand};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use rayon::prelude::*;

use angular_build::babel::{
    CallerOptions, DiagnosticReporter, FileContext, LoggerDiagnosticsHost, ResolutionReport,
    ScriptTarget, TransformSession,
};
use angular_build::bootstrap::{check_runtime_version, VersionCheck};
use angular_build::logging::{ConsoleLogger, LogLevel, Logger};

fn cli() -> Command {
    Command::new("ng-babel-config")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Angular Babel loader configuration (Rust implementation)")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("warn")
                .value_parser(clap::value_parser!(LogLevel))
                .global(true)
                .help("debug, info, warn or error"),
        )
        .arg(
            Arg::new("runtime-version")
                .long("runtime-version")
                .value_name("VERSION")
                .global(true)
                .help("Node.js version to validate instead of the one on PATH"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("resolve")
                .about("Resolve transform options for source files")
                .arg(
                    Arg::new("files")
                        .value_name("FILE")
                        .num_args(1..)
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("options")
                        .long("options")
                        .value_name("PATH")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("JSON file with loader options"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_name("TARGET")
                        .value_parser(clap::value_parser!(ScriptTarget))
                        .help("Script target, e.g. es2017"),
                )
                .arg(Arg::new("aot").long("aot").action(ArgAction::SetTrue))
                .arg(Arg::new("optimize").long("optimize").action(ArgAction::SetTrue))
                .arg(
                    Arg::new("side-effect-free")
                        .long("side-effect-free")
                        .action(ArgAction::SetTrue)
                        .help("Treat every module as side-effect free"),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    let level = matches
        .get_one::<LogLevel>("log-level")
        .copied()
        .unwrap_or(LogLevel::Warn);
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::new(level));

    if let Some(code) = run_version_gate(&matches, logger.as_ref()) {
        process::exit(code);
    }

    let result = match matches.subcommand() {
        Some(("resolve", sub)) => resolve(sub, logger.clone()),
        _ => unreachable!("subcommand is required"),
    };

    match result {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(err) => {
            logger.error(&format!("{:#}", err));
            process::exit(1);
        }
    }
}

fn run_version_gate(matches: &ArgMatches, logger: &dyn Logger) -> Option<i32> {
    let version = match matches.get_one::<String>("runtime-version") {
        Some(version) => version.clone(),
        None => match detect_node_version() {
            Some(version) => version,
            None => {
                logger.debug("Node.js not found on PATH; skipping runtime version check");
                return None;
            }
        },
    };

    let check = check_runtime_version(&version);
    match &check {
        VersionCheck::Supported => {}
        VersionCheck::Warn(message) => logger.warn(message),
        VersionCheck::Unsupported(message) => eprintln!("{}", message),
    }
    check.exit_code()
}

fn detect_node_version() -> Option<String> {
    let output = ProcessCommand::new("node").arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn resolve(matches: &ArgMatches, logger: Arc<dyn Logger>) -> Result<i32> {
    let mut caller = match matches.get_one::<PathBuf>("options") {
        Some(path) => CallerOptions::load(path)
            .with_context(|| format!("failed to load options from {}", path.display()))?,
        None => CallerOptions::default(),
    };
    if let Some(target) = matches.get_one::<ScriptTarget>("target") {
        caller.script_target = Some(*target);
    }
    if matches.get_flag("aot") {
        caller.aot = Some(true);
    }
    if matches.get_flag("optimize") {
        caller.optimize = true;
    }
    let side_effect_free = matches.get_flag("side-effect-free");

    let files: Vec<&PathBuf> = matches
        .get_many::<PathBuf>("files")
        .map(|files| files.collect())
        .unwrap_or_default();

    let session = TransformSession::builtin(logger.clone());
    let host = Arc::new(LoggerDiagnosticsHost::new(logger));
    let reporter = DiagnosticReporter::new(host.clone());

    let reports = files
        .par_iter()
        .map(|path| resolve_file(&session, &caller, path, side_effect_free, &reporter))
        .collect::<Result<Vec<_>>>()?;

    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(if host.error_count() > 0 { 1 } else { 0 })
}

fn resolve_file(
    session: &TransformSession,
    caller: &CallerOptions,
    path: &Path,
    side_effect_free: bool,
    reporter: &DiagnosticReporter,
) -> Result<ResolutionReport> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file = FileContext::new(path.to_string_lossy().into_owned(), source)
        .with_side_effect_free(side_effect_free);

    let (result, config) = session.transform_config(&file, caller, reporter.clone())?;
    let report = ResolutionReport::new(&file.path, &result, config.as_ref())?;
    Ok(report)
}
