//! envguard - command-line front end
//!
//! Loads a `.env` file into the process environment, then prints the loaded
//! keys with sensitive values masked, a single typed value, or a value with
//! its placeholders expanded.

use anyhow::Context;
use clap::Parser;
use envguard::{
    cli::{supports_color, Cli},
    coerce::{coerce, TargetKind},
    config::{display_config_summary, load_config, Config},
    error::{EnvError, ErrorReporter, OrAbort, Result},
    guard::{EnvGuard, LoadReport},
    logging::Logger,
    parser::ParseOptions,
    registry::{mask_value, Renderer, SensitiveEntry},
    PKG_NAME, VERSION,
};
use std::io::{self, Write};
use std::process;

fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();

    if cli.version {
        print_version();
        return;
    }

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(EnvError::config(message).exit_code());
    }

    let config = match load_config(cli.clone()) {
        Ok(config) => config,
        Err(e) => {
            let use_color = cli.use_colors().unwrap_or_else(supports_color);
            ErrorReporter::new(use_color, cli.debug).report_error(&e);
            process::exit(e.exit_code());
        }
    };

    let use_color = cli
        .use_colors()
        .unwrap_or_else(|| config.enable_color && supports_color());
    colored::control::set_override(use_color);
    let reporter = ErrorReporter::new(use_color, cli.debug);

    if let Err(e) = run_application(&cli, &config, &reporter, use_color) {
        let error = EnvError::from(e);
        reporter.report_error(&error);
        process::exit(error.exit_code());
    }
}

fn print_version() {
    println!("{} {}", PKG_NAME, VERSION);
    if let Some(commit) = option_env!("GIT_COMMIT") {
        println!("commit: {}", commit);
    }
    if let Some(built) = option_env!("BUILD_TIME") {
        println!("built: {}", built);
    }
}

/// Main application logic
fn run_application(
    cli: &Cli,
    config: &Config,
    reporter: &ErrorReporter,
    use_color: bool,
) -> anyhow::Result<()> {
    let logger = Logger::with_config(PKG_NAME, config);
    logger.add_context_field("env_file", config.env_file.display().to_string());
    logger
        .debug("configuration loaded")
        .field("summary", display_config_summary(config))
        .log();

    let mut guard = EnvGuard::process()
        .with_parse_options(ParseOptions {
            inline_comments: config.inline_comments,
        })
        .with_logger(logger.clone());

    let report = load_env_file(&mut guard, config, reporter)?;
    logger.info("environment loaded").field("report", report).log();

    if !config.sensitive_keys.is_empty() {
        guard
            .mark_sensitive(&config.sensitive_keys)
            .or_abort_with(reporter);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(key) = &cli.get {
        let value = get_value(&guard, key, cli)?;
        writeln!(out, "{}", value).context("failed to write value")?;
        return Ok(());
    }

    if let Some(key) = &cli.resolve {
        let resolved = guard.resolve_placeholder(key)?;
        let shown = if guard.registry().is_masked(key) {
            mask_value(&resolved)
        } else {
            resolved
        };
        writeln!(out, "{}", shown).context("failed to write resolved value")?;
        return Ok(());
    }

    let renderer = Renderer::new(use_color);
    for line in guard.render_with(&renderer) {
        writeln!(out, "{}", line).context("failed to write environment listing")?;
    }

    Ok(())
}

/// Load the configured file, honoring overload and required keys.
///
/// A missing or empty required key ends the process.
fn load_env_file(
    guard: &mut EnvGuard,
    config: &Config,
    reporter: &ErrorReporter,
) -> Result<LoadReport> {
    if config.overload {
        let report = guard.overload_file(&config.env_file)?;
        for key in &config.required_keys {
            guard.required(key).or_abort_with(reporter);
        }
        return Ok(report);
    }

    if config.required_keys.is_empty() {
        return guard.load_file(&config.env_file);
    }

    match guard.load_file_with_validation(&config.env_file, &config.required_keys) {
        Err(e) if e.is_fatal() => Ok(Err(e).or_abort_with(reporter)),
        other => other,
    }
}

/// Display text for `--get`, masked when the key is sensitive
fn get_value(guard: &EnvGuard, key: &str, cli: &Cli) -> Result<String> {
    let kind: TargetKind = cli.kind.as_deref().unwrap_or("string").parse()?;

    let value = match guard.get_kind(key, kind)? {
        Some(value) => value,
        None => match &cli.default {
            Some(raw) => coerce(raw, kind)?,
            None => return Err(EnvError::key_not_found(key)),
        },
    };

    let entry = SensitiveEntry {
        value,
        masked: guard.registry().is_masked(key),
    };
    Ok(entry.display_value())
}
