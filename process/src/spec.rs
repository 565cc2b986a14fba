//! Immutable description of one external command invocation.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything needed to launch the aggregator once.
///
/// Built fresh per invocation and handed to the runner by shared reference,
/// so nothing can change it after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    executable: String,
    args: Vec<String>,
    working_directory: PathBuf,
    /// Complete child environment. Empty means "inherit the parent's".
    environment: BTreeMap<OsString, OsString>,
    stdin_payload: Option<Vec<u8>>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(executable: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_directory: working_directory.into(),
            environment: BTreeMap::new(),
            stdin_payload: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn environment(mut self, environment: BTreeMap<OsString, OsString>) -> Self {
        self.environment = environment;
        self
    }

    pub fn stdin_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.stdin_payload = Some(payload.into());
        self
    }

    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    #[must_use]
    pub fn env(&self) -> &BTreeMap<OsString, OsString> {
        &self.environment
    }

    #[must_use]
    pub fn payload(&self) -> Option<&[u8]> {
        self.stdin_payload.as_deref()
    }

    /// `PATH` the child will see: from the explicit environment when one is
    /// set, otherwise inherited from this process.
    #[must_use]
    pub fn effective_path(&self) -> Option<OsString> {
        if self.environment.is_empty() {
            return std::env::var_os("PATH");
        }
        self.environment
            .iter()
            .find(|(key, _)| key.to_str().is_some_and(|k| k.eq_ignore_ascii_case("PATH")))
            .map(|(_, value)| value.clone())
    }

    /// Human-readable command line for logs and error messages.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}
