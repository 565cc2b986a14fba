//! The host-provided snapshot of one file for one lint pass.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// How the host triggered the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LintMode {
    /// Background linting while the user types; the buffer may be unsaved.
    Background,
    /// Explicit lint (e.g. on save); the on-disk file reflects the buffer.
    #[default]
    OnDemand,
}

impl LintMode {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::OnDemand => "on-demand",
        }
    }
}

/// Per-project settings attached to a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ViewSettings {
    /// Overrides the toolchain root variable (`GOROOT` by default).
    #[serde(default, rename = "toolchainRoot")]
    pub toolchain_root: Option<PathBuf>,
    /// Overrides the toolchain path variable (`GOPATH` by default).
    #[serde(default, rename = "toolchainPath")]
    pub toolchain_path: Option<PathBuf>,
}

/// Immutable snapshot of a buffer for the duration of one lint pass.
#[derive(Debug, Clone)]
pub struct SourceContext {
    path: Option<PathBuf>,
    text: String,
    settings: ViewSettings,
    mode: LintMode,
}

impl SourceContext {
    #[must_use]
    pub fn new(
        path: Option<PathBuf>,
        text: impl Into<String>,
        settings: ViewSettings,
        mode: LintMode,
    ) -> Self {
        Self {
            path,
            text: text.into(),
            settings,
            mode,
        }
    }

    /// Full path of the file, absent for a buffer that was never saved.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Containing directory, absent when the buffer has no on-disk location.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Basename of the file.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.as_deref().and_then(Path::file_name)
    }

    /// Live buffer text, which may differ from what is on disk.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    #[must_use]
    pub fn mode(&self) -> LintMode {
        self.mode
    }
}
