//! One lint pass: resolve the context, pick the live or in-place path, run
//! the aggregator, parse.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;

use metalint_ephemeral::{EphemeralWorkspace, list_siblings};
use metalint_process::{CommandSpec, ProcessRunner, SystemRunner};
use metalint_types::{Diagnostic, LintConfig, LintMode, SourceContext, ViewSettings};

use crate::environment::build_environment;
use crate::error::LintError;
use crate::notice::{Notice, NoticeSink, TracingNotices};
use crate::parser;

/// Why a pass produced no diagnostics without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsavedBuffer,
    TooManyFiles { count: usize, max: usize },
    NonUtf8FileName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintOutcome {
    Linted(Vec<Diagnostic>),
    Skipped(SkipReason),
}

impl LintOutcome {
    /// Diagnostics in aggregator output order; empty for a skipped pass.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Linted(diags) => diags,
            Self::Skipped(_) => &[],
        }
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::Linted(diags) => diags,
            Self::Skipped(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Linted(_) => None,
            Self::Skipped(reason) => Some(*reason),
        }
    }
}

/// Aggregator include pattern restricting output to `file_name`.
#[must_use]
pub fn include_filter(file_name: &str) -> String {
    format!("^{}", regex::escape(file_name))
}

/// Runs the configured aggregator for a buffer.
///
/// Holds no mutable state: concurrent passes, including passes over the same
/// directory, are independent.
#[derive(Debug)]
pub struct LintInvoker<R = SystemRunner, N = TracingNotices> {
    config: LintConfig,
    runner: R,
    notices: N,
}

impl LintInvoker {
    /// System runner with the configured output cap, notices to `tracing`.
    #[must_use]
    pub fn new(config: LintConfig) -> Self {
        let runner = SystemRunner::new(config.max_output_bytes());
        Self::with_parts(config, runner, TracingNotices)
    }
}

impl<R: ProcessRunner, N: NoticeSink> LintInvoker<R, N> {
    #[must_use]
    pub fn with_parts(config: LintConfig, runner: R, notices: N) -> Self {
        Self {
            config,
            runner,
            notices,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LintConfig {
        &self.config
    }

    /// Lint the buffer described by `ctx`.
    ///
    /// Background mode lints the live text through an ephemeral workspace;
    /// on-demand mode lints the file as saved. A buffer with no on-disk
    /// location is skipped in both modes.
    pub async fn lint(&self, ctx: &SourceContext) -> Result<LintOutcome, LintError> {
        let (Some(path), Some(dir)) = (ctx.path(), ctx.directory()) else {
            self.notices.notice(&Notice::UnsavedBuffer);
            return Ok(LintOutcome::Skipped(SkipReason::UnsavedBuffer));
        };
        let Some(file_name) = ctx.file_name().and_then(OsStr::to_str) else {
            self.notices.notice(&Notice::NonUtf8FileName {
                path: path.to_path_buf(),
            });
            return Ok(LintOutcome::Skipped(SkipReason::NonUtf8FileName));
        };

        self.notices.notice(&Notice::Mode {
            mode: ctx.mode(),
            file: path.to_path_buf(),
        });
        let environment = self.environment(ctx.settings());

        match ctx.mode() {
            LintMode::Background => {
                self.lint_live(dir, file_name, ctx.text(), environment)
                    .await
            }
            LintMode::OnDemand => self.lint_in_place(dir, file_name, environment).await,
        }
    }

    fn environment(&self, settings: &ViewSettings) -> BTreeMap<OsString, OsString> {
        let overrides = [
            (self.config.toolchain_root_var(), &settings.toolchain_root),
            (self.config.toolchain_path_var(), &settings.toolchain_path),
        ];
        for (var, value) in overrides {
            if let Some(value) = value {
                self.notices.notice(&Notice::EnvironmentOverride {
                    var: var.to_string(),
                    value: value.display().to_string(),
                });
            }
        }
        build_environment(std::env::vars_os(), &self.config, settings)
    }

    async fn lint_live(
        &self,
        dir: &Path,
        file_name: &str,
        text: &str,
        environment: BTreeMap<OsString, OsString>,
    ) -> Result<LintOutcome, LintError> {
        let siblings = list_siblings(dir, self.config.file_extension())?;
        let max = self.config.max_live_files();
        if siblings.len() > max {
            let count = siblings.len();
            self.notices.notice(&Notice::TooManyFiles {
                dir: dir.to_path_buf(),
                count,
                max,
            });
            return Ok(LintOutcome::Skipped(SkipReason::TooManyFiles { count, max }));
        }

        let workspace = EphemeralWorkspace::build(dir, &siblings, file_name, text.as_bytes())?;
        tracing::debug!(
            root = %workspace.root().display(),
            entries = workspace.entries().len(),
            "Built live workspace"
        );

        let spec = self.command_spec(workspace.root(), file_name, environment);
        let output = self.run(&spec).await;

        let root = workspace.root().to_path_buf();
        if let Err(e) = workspace.release() {
            tracing::warn!(root = %root.display(), "Failed to remove live workspace: {e}");
        }

        Ok(LintOutcome::Linted(diagnostics_from(&output?)))
    }

    async fn lint_in_place(
        &self,
        dir: &Path,
        file_name: &str,
        environment: BTreeMap<OsString, OsString>,
    ) -> Result<LintOutcome, LintError> {
        let spec = self.command_spec(dir, file_name, environment);
        let output = self.run(&spec).await?;
        Ok(LintOutcome::Linted(diagnostics_from(&output)))
    }

    fn command_spec(
        &self,
        working_directory: &Path,
        file_name: &str,
        environment: BTreeMap<OsString, OsString>,
    ) -> CommandSpec {
        let include = [
            self.config.include_flag().to_string(),
            include_filter(file_name),
        ];
        CommandSpec::new(self.config.command(), working_directory)
            .args(self.config.args().iter().cloned().chain(include))
            .environment(environment)
    }

    async fn run(&self, spec: &CommandSpec) -> Result<Vec<u8>, LintError> {
        match self.runner.run(spec, self.config.capture()).await {
            Ok(output) => Ok(output),
            Err(e) => {
                self.notices.notice(&Notice::LaunchFailed {
                    command_line: e.command_line().to_string(),
                    path: e.path().to_string(),
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }
}

fn diagnostics_from(output: &[u8]) -> Vec<Diagnostic> {
    let text = String::from_utf8_lossy(output);
    parser::parse(&text).collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use metalint_ephemeral::WORKSPACE_PREFIX;
    use metalint_process::{CaptureMode, LaunchError, RunFut};
    use metalint_types::Severity;

    use super::*;

    /// What the runner observed for one call.
    #[derive(Debug, Clone)]
    struct Call {
        spec: CommandSpec,
        capture: CaptureMode,
        files: Vec<(String, String)>,
    }

    /// Replays canned output and records each call, including a snapshot of
    /// the working directory as the aggregator would have seen it.
    struct ScriptedRunner {
        output: Option<Vec<u8>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedRunner {
        fn replying(output: &str) -> Self {
            Self {
                output: Some(output.as_bytes().to_vec()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                output: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn snapshot(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                (name, fs::read_to_string(e.path()).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    impl ProcessRunner for ScriptedRunner {
        fn run<'a>(&'a self, spec: &'a CommandSpec, capture: CaptureMode) -> RunFut<'a> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(Call {
                    spec: spec.clone(),
                    capture,
                    files: snapshot(spec.working_directory()),
                });
                match &self.output {
                    Some(out) => Ok(out.clone()),
                    None => Err(LaunchError::Spawn {
                        command_line: spec.command_line(),
                        path: "/nowhere".to_string(),
                        source: io::Error::from(io::ErrorKind::PermissionDenied),
                    }),
                }
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotices(Mutex<Vec<Notice>>);

    impl RecordingNotices {
        fn taken(&self) -> Vec<Notice> {
            self.0.lock().unwrap().clone()
        }
    }

    impl NoticeSink for RecordingNotices {
        fn notice(&self, notice: &Notice) {
            self.0.lock().unwrap().push(notice.clone());
        }
    }

    fn invoker(runner: ScriptedRunner) -> LintInvoker<ScriptedRunner, RecordingNotices> {
        LintInvoker::with_parts(LintConfig::default(), runner, RecordingNotices::default())
    }

    fn go_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in files {
            fs::write(dir.path().join(name), text).unwrap();
        }
        dir
    }

    fn workspaces_left(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(WORKSPACE_PREFIX))
            .count()
    }

    fn ctx(path: Option<PathBuf>, text: &str, mode: LintMode) -> SourceContext {
        SourceContext::new(path, text, ViewSettings::default(), mode)
    }

    #[test]
    fn include_filter_is_anchored_and_escaped() {
        assert_eq!(include_filter("a.go"), r"^a\.go");
        let re = regex::Regex::new(&include_filter("a.go")).unwrap();
        assert!(re.is_match("a.go:3:2:error:x"));
        assert!(!re.is_match("ba.go:3:2:error:x"));
        assert!(!re.is_match("a_go:3:2:error:x"));
    }

    #[tokio::test]
    async fn live_pass_lints_unsaved_text_next_to_siblings() {
        let dir = go_dir(&[("a.go", "package p\n"), ("b.go", "package p\n\nfunc B() {}\n")]);
        let live = "package p\n\nfunc A() { x := 1 }\n";
        let lint = invoker(ScriptedRunner::replying(
            "a.go:3:2:error:unused variable x\nOK: linters finished\n",
        ));

        let outcome = lint
            .lint(&ctx(Some(dir.path().join("a.go")), live, LintMode::Background))
            .await
            .unwrap();

        assert_eq!(
            outcome.diagnostics(),
            [Diagnostic::new("a.go", 3, Some(2), Severity::Error, "unused variable x")]
        );

        let calls = lint.runner.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        let cwd = call.spec.working_directory();
        assert_eq!(cwd.parent(), Some(dir.path()));
        assert!(
            cwd.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(WORKSPACE_PREFIX)
        );
        assert_eq!(
            call.files,
            [
                ("a.go".to_string(), live.to_string()),
                ("b.go".to_string(), "package p\n\nfunc B() {}\n".to_string()),
            ]
        );
        assert_eq!(call.spec.executable(), "gometalinter");
        assert_eq!(call.spec.arguments(), ["--fast", ".", "-I", r"^a\.go"]);
        assert_eq!(call.spec.payload(), None);
        assert_eq!(call.capture, CaptureMode::Both);

        assert_eq!(workspaces_left(dir.path()), 0);
        assert_eq!(fs::read_to_string(dir.path().join("a.go")).unwrap(), "package p\n");
    }

    #[tokio::test]
    async fn live_pass_over_limit_never_runs() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..41 {
            fs::write(dir.path().join(format!("f{i:02}.go")), "package p\n").unwrap();
        }
        let lint = invoker(ScriptedRunner::replying("f00.go:1:1:error:x\n"));

        let outcome = lint
            .lint(&ctx(Some(dir.path().join("f00.go")), "package p\n", LintMode::Background))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            LintOutcome::Skipped(SkipReason::TooManyFiles { count: 41, max: 40 })
        );
        assert!(outcome.diagnostics().is_empty());
        assert!(lint.runner.calls().is_empty());
        assert!(lint.notices.taken().iter().any(|n| matches!(
            n,
            Notice::TooManyFiles { count: 41, max: 40, .. }
        )));
        assert_eq!(workspaces_left(dir.path()), 0);
    }

    #[tokio::test]
    async fn configured_limit_and_capture_are_honored() {
        let dir = go_dir(&[("a.go", "package p\n"), ("b.go", "package p\n")]);
        let config = LintConfig::default()
            .with_max_live_files(2)
            .with_capture(CaptureMode::Stdout);
        let lint = LintInvoker::with_parts(
            config.clone().with_max_live_files(1),
            ScriptedRunner::replying(""),
            RecordingNotices::default(),
        );
        let path = Some(dir.path().join("a.go"));

        let outcome = lint
            .lint(&ctx(path.clone(), "package p\n", LintMode::Background))
            .await
            .unwrap();
        assert_eq!(
            outcome.skip_reason(),
            Some(SkipReason::TooManyFiles { count: 2, max: 1 })
        );

        let lint = LintInvoker::with_parts(
            config,
            ScriptedRunner::replying(""),
            RecordingNotices::default(),
        );
        lint.lint(&ctx(path, "package p\n", LintMode::Background))
            .await
            .unwrap();
        assert_eq!(lint.runner.calls()[0].capture, CaptureMode::Stdout);
    }

    #[tokio::test]
    async fn limit_does_not_apply_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..41 {
            fs::write(dir.path().join(format!("f{i:02}.go")), "package p\n").unwrap();
        }
        let lint = invoker(ScriptedRunner::replying(""));

        let outcome = lint
            .lint(&ctx(Some(dir.path().join("f00.go")), "package p\n", LintMode::OnDemand))
            .await
            .unwrap();

        assert_eq!(outcome, LintOutcome::Linted(Vec::new()));
        assert_eq!(lint.runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn unsaved_buffer_is_skipped_in_both_modes() {
        for mode in [LintMode::Background, LintMode::OnDemand] {
            let lint = invoker(ScriptedRunner::replying("a.go:1:1:error:x\n"));
            let outcome = lint.lint(&ctx(None, "package p\n", mode)).await.unwrap();

            assert_eq!(outcome, LintOutcome::Skipped(SkipReason::UnsavedBuffer));
            assert!(lint.runner.calls().is_empty());
            assert_eq!(lint.notices.taken(), [Notice::UnsavedBuffer]);
        }
    }

    #[tokio::test]
    async fn bare_file_name_has_no_directory() {
        let lint = invoker(ScriptedRunner::replying(""));
        let outcome = lint
            .lint(&ctx(Some(PathBuf::from("a.go")), "", LintMode::Background))
            .await
            .unwrap();
        assert_eq!(outcome.skip_reason(), Some(SkipReason::UnsavedBuffer));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_file_name_is_skipped_with_notice() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(OsString::from_vec(b"bad\xff.go".to_vec()));
        let lint = invoker(ScriptedRunner::replying("a.go:1:1:error:x\n"));

        let outcome = lint
            .lint(&ctx(Some(path.clone()), "package p\n", LintMode::Background))
            .await
            .unwrap();

        assert_eq!(outcome.skip_reason(), Some(SkipReason::NonUtf8FileName));
        assert!(lint.runner.calls().is_empty());
        assert_eq!(lint.notices.taken(), [Notice::NonUtf8FileName { path }]);
    }

    #[tokio::test]
    async fn on_demand_runs_in_real_directory() {
        let dir = go_dir(&[("a.go", "package p\n")]);
        let lint = invoker(ScriptedRunner::replying(
            "a.go:1::warning:package comment should be of the form \"Package p ...\"\n",
        ));

        let outcome = lint
            .lint(&ctx(Some(dir.path().join("a.go")), "ignored", LintMode::OnDemand))
            .await
            .unwrap();

        let diags = outcome.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity(), Severity::Warning);
        assert_eq!(diags[0].column(), None);

        let calls = lint.runner.calls();
        assert_eq!(calls[0].spec.working_directory(), dir.path());
        assert_eq!(calls[0].files, [("a.go".to_string(), "package p\n".to_string())]);
    }

    #[tokio::test]
    async fn view_settings_override_toolchain_variables() {
        let dir = go_dir(&[("a.go", "package p\n")]);
        let config = LintConfig::default();
        let lint = LintInvoker::with_parts(
            config,
            ScriptedRunner::replying(""),
            RecordingNotices::default(),
        );
        let settings = ViewSettings {
            toolchain_root: Some(PathBuf::from("/opt/go")),
            toolchain_path: Some(PathBuf::from("/work/gopath")),
        };
        let ctx = SourceContext::new(
            Some(dir.path().join("a.go")),
            "package p\n",
            settings,
            LintMode::OnDemand,
        );

        lint.lint(&ctx).await.unwrap();

        let calls = lint.runner.calls();
        let env = calls[0].spec.env();
        assert_eq!(env[OsStr::new("GOROOT")], "/opt/go");
        assert_eq!(env[OsStr::new("GOPATH")], "/work/gopath");
        assert!(lint.notices.taken().contains(&Notice::EnvironmentOverride {
            var: "GOROOT".to_string(),
            value: "/opt/go".to_string(),
        }));
    }

    #[tokio::test]
    async fn launch_failure_is_error_and_cleans_up() {
        let dir = go_dir(&[("a.go", "package p\n")]);
        let lint = invoker(ScriptedRunner::failing());

        let err = lint
            .lint(&ctx(Some(dir.path().join("a.go")), "package p\n", LintMode::Background))
            .await
            .unwrap_err();

        assert!(matches!(err, LintError::Launch(LaunchError::Spawn { .. })));
        assert_eq!(workspaces_left(dir.path()), 0);
        assert!(lint.notices.taken().iter().any(|n| matches!(
            n,
            Notice::LaunchFailed { path, .. } if path == "/nowhere"
        )));
    }

    #[tokio::test]
    async fn unreadable_directory_is_workspace_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        let lint = invoker(ScriptedRunner::replying(""));

        let err = lint
            .lint(&ctx(Some(gone.join("a.go")), "package p\n", LintMode::Background))
            .await
            .unwrap_err();

        assert!(matches!(err, LintError::Workspace(_)));
        assert!(lint.runner.calls().is_empty());
    }
}
