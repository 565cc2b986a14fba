//! metalint CLI - a host adapter around [`metalint_lint::LintInvoker`].
//!
//! ```text
//! main() -> load config -> SourceContext (disk or stdin) -> lint() -> print
//! ```
//!
//! Exit status: 0 when clean or skipped, 1 when any error diagnostic was
//! reported, 2 when the pass could not run, 130 when interrupted.

mod args;
mod output;
mod shutdown;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use metalint_config::MetalintConfig;
use metalint_lint::{LintInvoker, SourceContext};
use metalint_process::SystemRunner;

use crate::args::{Cli, Commands, LintArgs};
use crate::output::{EXIT_FAILURE, StderrNotices};
use crate::shutdown::{EXIT_INTERRUPTED, Shutdown};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Stdout is reserved for diagnostics and stderr for notices; no log
    // file means no logs.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.metalint/logs/metalint.log
    if let Some(config_path) = MetalintConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("metalint.log"));
    }

    // Fallback: ./.metalint/logs/metalint.log
    candidates.push(PathBuf::from(".metalint").join("logs").join("metalint.log"));

    candidates
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            // Library errors already carry their cause in the message.
            tracing::error!("{err}");
            eprintln!("metalint: {err}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let mut config = MetalintConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Lint(args) => {
            if let Some(root) = &args.toolchain_root {
                config.settings.toolchain_root = Some(root.clone());
            }
            if let Some(path) = &args.toolchain_path {
                config.settings.toolchain_path = Some(path.clone());
            }
            lint(config, &args).await
        }
    }
}

async fn lint(config: MetalintConfig, args: &LintArgs) -> Result<u8> {
    let path = std::path::absolute(&args.file)
        .map_err(|e| anyhow!("resolving {}: {e}", args.file.display()))?;
    let text = read_buffer(&path, args.stdin).await?;
    let ctx = SourceContext::new(Some(path), text, config.settings, args.lint_mode());

    let runner = SystemRunner::new(config.lint.max_output_bytes());
    let invoker = LintInvoker::with_parts(config.lint, runner, StderrNotices);

    let mut shutdown =
        Shutdown::install().map_err(|e| anyhow!("installing signal handlers: {e}"))?;
    let outcome = tokio::select! {
        outcome = invoker.lint(&ctx) => outcome?,
        signal = shutdown.recv() => {
            tracing::info!(signal, "Lint pass cancelled");
            eprintln!("metalint: interrupted by {signal}");
            return Ok(EXIT_INTERRUPTED);
        }
    };

    let diagnostics = outcome.diagnostics();
    let mut stdout = io::stdout().lock();
    output::write_diagnostics(&mut stdout, diagnostics, args.format)
        .and_then(|()| stdout.flush())
        .map_err(|e| anyhow!("writing diagnostics: {e}"))?;

    Ok(output::exit_code(diagnostics))
}

async fn read_buffer(path: &Path, from_stdin: bool) -> Result<String> {
    if from_stdin {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| anyhow!("reading buffer from stdin: {e}"))?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("reading {}: {e}", path.display()))
}
