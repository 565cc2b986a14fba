//! Configuration loading for metalint.
//!
//! Looks for `~/.metalint/config.toml` unless an explicit path is given. A
//! missing default file means defaults; an explicit path must exist.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use metalint_types::{LintConfig, ViewSettings};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetalintConfig {
    /// Aggregator invocation.
    #[serde(default)]
    pub lint: LintConfig,
    /// Default view settings applied to every buffer.
    #[serde(default)]
    pub settings: ViewSettings,
}

/// Expand `${VAR}` references. Unset variables expand to the empty string;
/// an unterminated `${` is kept literally.
pub fn expand_env_vars(value: &str) -> String {
    expand_vars_with(value, |var| env::var(var).ok())
}

fn expand_vars_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&lookup(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// `${VAR}` expansion followed by `~/` expansion to the home directory.
fn expand_path(
    path: &Path,
    home: Option<&Path>,
    lookup: &impl Fn(&str) -> Option<String>,
) -> PathBuf {
    let expanded = expand_vars_with(&path.to_string_lossy(), lookup);
    match (expanded.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(expanded),
    }
}

impl MetalintConfig {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), err);
                return Err(ConfigError::Read { path, source: err });
            }
        };

        match Self::from_toml(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Loaded config");
                Ok(config)
            }
            Err(err) => {
                tracing::warn!("Failed to parse config at {}: {}", path.display(), err);
                Err(ConfigError::Parse { path, source: err })
            }
        }
    }

    /// Parse TOML text and expand variables in settings paths.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        Self::from_toml_with(content, dirs::home_dir().as_deref(), |var| env::var(var).ok())
    }

    fn from_toml_with(
        content: &str,
        home: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.expand(home, &lookup);
        Ok(config)
    }

    fn expand(&mut self, home: Option<&Path>, lookup: &impl Fn(&str) -> Option<String>) {
        for slot in [
            &mut self.settings.toolchain_root,
            &mut self.settings.toolchain_path,
        ] {
            if let Some(path) = slot.take() {
                let expanded = expand_path(&path, home, lookup);
                // An override that expanded to nothing means "inherit".
                if !expanded.as_os_str().is_empty() {
                    *slot = Some(expanded);
                }
            }
        }
    }

    pub fn path() -> Option<PathBuf> {
        config_path()
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".metalint").join("config.toml"))
}
