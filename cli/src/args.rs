//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use metalint_types::LintMode;

/// Lint Go buffers, saved or not, through gometalinter
#[derive(Debug, Parser)]
#[command(name = "metalint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (default: ~/.metalint/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lint one file
    Lint(LintArgs),
}

#[derive(Debug, clap::Args)]
pub struct LintArgs {
    /// File being edited
    pub file: PathBuf,

    /// Read the live buffer from stdin instead of the file on disk
    #[arg(long)]
    pub stdin: bool,

    /// Lint mode (default: background with --stdin, on-demand otherwise)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Override the toolchain root for this run
    #[arg(long, value_name = "DIR")]
    pub toolchain_root: Option<PathBuf>,

    /// Override the toolchain path for this run
    #[arg(long, value_name = "DIR")]
    pub toolchain_path: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

impl LintArgs {
    pub fn lint_mode(&self) -> LintMode {
        match self.mode {
            Some(ModeArg::Background) => LintMode::Background,
            Some(ModeArg::OnDemand) => LintMode::OnDemand,
            None if self.stdin => LintMode::Background,
            None => LintMode::OnDemand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Background,
    OnDemand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}
