//! Resolved lint configuration shared across crates.
//!
//! The raw TOML shape (every field optional) stays private; deserialization
//! goes through `#[serde(try_from)]` so a `LintConfig` value is always valid.

use serde::Deserialize;

const DEFAULT_COMMAND: &str = "gometalinter";
const DEFAULT_ARGS: &[&str] = &["--fast", "."];
const DEFAULT_FILE_EXTENSION: &str = "go";
const DEFAULT_INCLUDE_FLAG: &str = "-I";
const DEFAULT_MAX_LIVE_FILES: usize = 40;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;
const DEFAULT_TOOLCHAIN_ROOT_VAR: &str = "GOROOT";
const DEFAULT_TOOLCHAIN_PATH_VAR: &str = "GOPATH";

/// Which output streams of the aggregator are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    Stdout,
    Stderr,
    /// Stdout followed by stderr, newline separated.
    #[default]
    Both,
}

impl CaptureMode {
    #[must_use]
    pub fn captures_stdout(self) -> bool {
        matches!(self, Self::Stdout | Self::Both)
    }

    #[must_use]
    pub fn captures_stderr(self) -> bool {
        matches!(self, Self::Stderr | Self::Both)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LintConfigError {
    #[error("lint command must not be empty")]
    EmptyCommand,
    #[error("file_extension must not be empty")]
    EmptyExtension,
    #[error("include_flag must not be empty")]
    EmptyIncludeFlag,
    #[error("max_output_bytes must be greater than zero")]
    ZeroOutputLimit,
    #[error("toolchain variable names must not be empty")]
    EmptyVariableName,
}

#[derive(Deserialize)]
struct RawLintConfig {
    command: Option<String>,
    args: Option<Vec<String>>,
    file_extension: Option<String>,
    include_flag: Option<String>,
    max_live_files: Option<usize>,
    #[serde(default)]
    capture: CaptureMode,
    max_output_bytes: Option<usize>,
    toolchain_root_var: Option<String>,
    toolchain_path_var: Option<String>,
}

/// Validated aggregator configuration.
///
/// Invariants: `command`, `file_extension`, `include_flag` and both variable
/// names are non-empty; `file_extension` carries no leading dot;
/// `max_output_bytes > 0`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawLintConfig")]
pub struct LintConfig {
    command: String,
    args: Vec<String>,
    file_extension: String,
    include_flag: String,
    max_live_files: usize,
    capture: CaptureMode,
    max_output_bytes: usize,
    toolchain_root_var: String,
    toolchain_path_var: String,
}

fn non_empty(
    value: Option<String>,
    default: &str,
    err: LintConfigError,
) -> Result<String, LintConfigError> {
    match value {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(err),
        Some(v) => Ok(v),
    }
}

impl TryFrom<RawLintConfig> for LintConfig {
    type Error = LintConfigError;

    fn try_from(raw: RawLintConfig) -> Result<Self, Self::Error> {
        let command = non_empty(raw.command, DEFAULT_COMMAND, LintConfigError::EmptyCommand)?;
        let file_extension = non_empty(
            raw.file_extension,
            DEFAULT_FILE_EXTENSION,
            LintConfigError::EmptyExtension,
        )?;
        let file_extension = file_extension.trim_start_matches('.').to_string();
        if file_extension.is_empty() {
            return Err(LintConfigError::EmptyExtension);
        }
        let include_flag = non_empty(
            raw.include_flag,
            DEFAULT_INCLUDE_FLAG,
            LintConfigError::EmptyIncludeFlag,
        )?;
        let max_output_bytes = raw.max_output_bytes.unwrap_or(DEFAULT_MAX_OUTPUT_BYTES);
        if max_output_bytes == 0 {
            return Err(LintConfigError::ZeroOutputLimit);
        }
        let toolchain_root_var = non_empty(
            raw.toolchain_root_var,
            DEFAULT_TOOLCHAIN_ROOT_VAR,
            LintConfigError::EmptyVariableName,
        )?;
        let toolchain_path_var = non_empty(
            raw.toolchain_path_var,
            DEFAULT_TOOLCHAIN_PATH_VAR,
            LintConfigError::EmptyVariableName,
        )?;

        Ok(Self {
            command,
            args: raw
                .args
                .unwrap_or_else(|| DEFAULT_ARGS.iter().map(|s| (*s).to_string()).collect()),
            file_extension,
            include_flag,
            max_live_files: raw.max_live_files.unwrap_or(DEFAULT_MAX_LIVE_FILES),
            capture: raw.capture,
            max_output_bytes,
            toolchain_root_var,
            toolchain_path_var,
        })
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            args: DEFAULT_ARGS.iter().map(|s| (*s).to_string()).collect(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            include_flag: DEFAULT_INCLUDE_FLAG.to_string(),
            max_live_files: DEFAULT_MAX_LIVE_FILES,
            capture: CaptureMode::default(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            toolchain_root_var: DEFAULT_TOOLCHAIN_ROOT_VAR.to_string(),
            toolchain_path_var: DEFAULT_TOOLCHAIN_PATH_VAR.to_string(),
        }
    }
}

impl LintConfig {
    /// Replace the aggregator executable and its base arguments.
    pub fn with_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.command = command.into();
        self.args = args;
        self
    }

    /// Replace the sibling cap for background linting.
    pub fn with_max_live_files(mut self, max: usize) -> Self {
        self.max_live_files = max;
        self
    }

    pub fn with_capture(mut self, capture: CaptureMode) -> Self {
        self.capture = capture;
        self
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Extension (without the dot) that identifies sibling files.
    #[must_use]
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }

    #[must_use]
    pub fn include_flag(&self) -> &str {
        &self.include_flag
    }

    /// Background passes over directories with more siblings than this are skipped.
    #[must_use]
    pub fn max_live_files(&self) -> usize {
        self.max_live_files
    }

    #[must_use]
    pub fn capture(&self) -> CaptureMode {
        self.capture
    }

    /// Per-stream cap on captured output.
    #[must_use]
    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    #[must_use]
    pub fn toolchain_root_var(&self) -> &str {
        &self.toolchain_root_var
    }

    #[must_use]
    pub fn toolchain_path_var(&self) -> &str {
        &self.toolchain_path_var
    }
}
