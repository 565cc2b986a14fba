use std::io;

/// The aggregator could not be started at all.
///
/// Carries the attempted command line and the `PATH` the child would have
/// seen so missing-toolchain setups can be diagnosed from the message alone.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("`{command_line}`: executable not found (PATH={path}): {source}")]
    NotFound {
        command_line: String,
        path: String,
        #[source]
        source: which::Error,
    },
    #[error("failed to launch `{command_line}` (PATH={path}): {source}")]
    Spawn {
        command_line: String,
        path: String,
        #[source]
        source: io::Error,
    },
}

impl LaunchError {
    #[must_use]
    pub fn command_line(&self) -> &str {
        match self {
            Self::NotFound { command_line, .. } | Self::Spawn { command_line, .. } => command_line,
        }
    }

    /// The `PATH` value in effect for the failed launch.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path, .. } | Self::Spawn { path, .. } => path,
        }
    }
}
