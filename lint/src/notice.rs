//! User-facing notices raised during a lint pass.
//!
//! Notices never change the outcome of a pass; they tell the user why a pass
//! was skipped or failed and which mode and environment were used.

use std::fmt;
use std::path::PathBuf;

use metalint_types::LintMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The buffer has no on-disk location; the aggregator works on
    /// directories, so nothing can be linted.
    UnsavedBuffer,
    /// The file name cannot be passed to the aggregator as a filter.
    NonUtf8FileName { path: PathBuf },
    /// Background linting was skipped because the directory is too large.
    TooManyFiles {
        dir: PathBuf,
        count: usize,
        max: usize,
    },
    /// The aggregator could not be started.
    LaunchFailed {
        command_line: String,
        path: String,
        error: String,
    },
    /// The mode a pass is running in.
    Mode { mode: LintMode, file: PathBuf },
    /// A toolchain variable taken from view settings instead of the host.
    EnvironmentOverride { var: String, value: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsavedBuffer => f.write_str("buffer has never been saved; skipping lint"),
            Self::NonUtf8FileName { path } => write!(
                f,
                "{} is not a UTF-8 file name; skipping lint",
                path.display()
            ),
            Self::TooManyFiles { dir, count, max } => write!(
                f,
                "{} has {count} source files (limit {max}); skipping background lint, save to lint",
                dir.display()
            ),
            Self::LaunchFailed {
                command_line,
                path,
                error,
            } => write!(
                f,
                "could not run `{command_line}`: {error}; check that the aggregator is installed and on PATH={path}"
            ),
            Self::Mode { mode, file } => {
                write!(f, "lint ({}) {}", mode.label(), file.display())
            }
            Self::EnvironmentOverride { var, value } => write!(f, "using {var}={value}"),
        }
    }
}

/// Where notices go. Hosts route them to a status bar, a console or a log.
pub trait NoticeSink: Send + Sync {
    fn notice(&self, notice: &Notice);
}

/// Sends notices to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotices;

impl NoticeSink for TracingNotices {
    fn notice(&self, notice: &Notice) {
        match notice {
            Notice::LaunchFailed { .. } => tracing::warn!("{notice}"),
            Notice::UnsavedBuffer
            | Notice::NonUtf8FileName { .. }
            | Notice::TooManyFiles { .. } => tracing::info!("{notice}"),
            Notice::Mode { .. } | Notice::EnvironmentOverride { .. } => {
                tracing::debug!("{notice}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_files_names_both_counts() {
        let notice = Notice::TooManyFiles {
            dir: PathBuf::from("/src/p"),
            count: 41,
            max: 40,
        };
        let text = notice.to_string();
        assert!(text.contains("/src/p"));
        assert!(text.contains("41"));
        assert!(text.contains("limit 40"));
    }

    #[test]
    fn launch_failure_names_command_and_path() {
        let notice = Notice::LaunchFailed {
            command_line: "gometalinter --fast .".to_string(),
            path: "/usr/bin".to_string(),
            error: "not found".to_string(),
        };
        let text = notice.to_string();
        assert!(text.contains("`gometalinter --fast .`"));
        assert!(text.contains("PATH=/usr/bin"));
    }

    #[test]
    fn mode_notice_uses_label() {
        let notice = Notice::Mode {
            mode: LintMode::Background,
            file: PathBuf::from("/src/p/a.go"),
        };
        assert_eq!(
            notice.to_string(),
            format!("lint ({}) /src/p/a.go", LintMode::Background.label())
        );
    }
}
