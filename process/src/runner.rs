//! The process runner seam and its system implementation.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::error::LaunchError;
use crate::guard::{ChildGuard, set_new_session};
use crate::spec::CommandSpec;
use metalint_types::CaptureMode;

/// Runner future type alias.
pub type RunFut<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, LaunchError>> + Send + 'a>>;

/// Launches a command and returns the captured output.
///
/// Implementations must treat a non-zero exit status as success: the
/// aggregator exits non-zero whenever it found anything.
pub trait ProcessRunner: Send + Sync {
    fn run<'a>(&'a self, spec: &'a CommandSpec, capture: CaptureMode) -> RunFut<'a>;
}

const DEFAULT_MAX_OUTPUT_BYTES: usize = 4 * 1024 * 1024;

const READ_CHUNK_BYTES: usize = 8192;

/// Runs commands as real child processes via `tokio::process`.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    max_output_bytes: usize,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_BYTES)
    }
}

impl SystemRunner {
    /// `max_output_bytes` caps each captured stream independently.
    #[must_use]
    pub fn new(max_output_bytes: usize) -> Self {
        Self {
            max_output_bytes: max_output_bytes.max(1),
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec, capture: CaptureMode) -> RunFut<'a> {
        Box::pin(run_command(spec, capture, self.max_output_bytes))
    }
}

fn pipe_if(wanted: bool) -> Stdio {
    if wanted { Stdio::piped() } else { Stdio::null() }
}

async fn run_command(
    spec: &CommandSpec,
    capture: CaptureMode,
    max_output_bytes: usize,
) -> Result<Vec<u8>, LaunchError> {
    let command_line = spec.command_line();
    let path = spec.effective_path().map_or_else(
        || "(unset)".to_string(),
        |path| path.to_string_lossy().into_owned(),
    );

    let program = match which::which_in(
        spec.executable(),
        spec.effective_path(),
        spec.working_directory(),
    ) {
        Ok(program) => program,
        Err(source) => {
            tracing::warn!(
                command = %command_line,
                path = %path,
                "Aggregator executable not found: {source}"
            );
            return Err(LaunchError::NotFound {
                command_line,
                path,
                source,
            });
        }
    };

    let mut cmd = Command::new(&program);
    cmd.args(spec.arguments())
        .current_dir(spec.working_directory())
        .stdin(pipe_if(spec.payload().is_some()))
        .stdout(pipe_if(capture.captures_stdout()))
        .stderr(pipe_if(capture.captures_stderr()));

    if !spec.env().is_empty() {
        cmd.env_clear();
        cmd.envs(spec.env());
    }

    set_new_session(&mut cmd);

    tracing::debug!(
        command = %command_line,
        cwd = %spec.working_directory().display(),
        "Launching aggregator"
    );

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            tracing::warn!(
                command = %command_line,
                path = %path,
                cwd = %spec.working_directory().display(),
                "Failed to launch aggregator: {source}"
            );
            return Err(LaunchError::Spawn {
                command_line,
                path,
                source,
            });
        }
    };

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut guard = ChildGuard::new(child);

    let stdin_task = match (stdin, spec.payload()) {
        (Some(mut stdin), Some(payload)) => {
            let payload = payload.to_vec();
            Some(tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&payload).await {
                    tracing::debug!("Aggregator closed stdin early: {e}");
                }
                // Dropping the handle closes the stream.
            }))
        }
        _ => None,
    };
    let stdout_task = stdout.map(|s| tokio::spawn(read_to_end_limited(s, max_output_bytes)));
    let stderr_task = stderr.map(|s| tokio::spawn(read_to_end_limited(s, max_output_bytes)));

    match guard.wait().await {
        Ok(status) => {
            tracing::debug!(
                command = %command_line,
                exit_code = ?status.code(),
                "Aggregator finished"
            );
        }
        Err(e) => {
            tracing::warn!(command = %command_line, "Failed to wait on aggregator: {e}");
        }
    }
    guard.disarm();

    if let Some(task) = stdin_task {
        let _ = task.await;
    }
    let stdout_bytes = collect(stdout_task, "stdout", &command_line).await;
    let stderr_bytes = collect(stderr_task, "stderr", &command_line).await;

    Ok(match capture {
        CaptureMode::Stdout => stdout_bytes,
        CaptureMode::Stderr => stderr_bytes,
        CaptureMode::Both => {
            let mut combined = stdout_bytes;
            combined.push(b'\n');
            combined.extend_from_slice(&stderr_bytes);
            combined
        }
    })
}

async fn collect(
    task: Option<tokio::task::JoinHandle<(Vec<u8>, bool)>>,
    stream: &'static str,
    command_line: &str,
) -> Vec<u8> {
    let Some(task) = task else {
        return Vec::new();
    };
    let (bytes, truncated) = task.await.unwrap_or_else(|_| (Vec::new(), false));
    if truncated {
        tracing::warn!(
            command = %command_line,
            stream,
            kept_bytes = bytes.len(),
            "Aggregator output truncated"
        );
    }
    bytes
}

async fn read_to_end_limited<R: AsyncRead + Unpin + Send + 'static>(
    mut reader: R,
    max_bytes: usize,
) -> (Vec<u8>, bool) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; READ_CHUNK_BYTES];
    let mut truncated = false;

    loop {
        let n = match reader.read(&mut tmp).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let remaining = max_bytes.saturating_sub(buf.len());
        if remaining == 0 {
            truncated = true;
            break;
        }
        let take = remaining.min(n);
        buf.extend_from_slice(&tmp[..take]);
        if take < n {
            truncated = true;
            break;
        }
    }

    (buf, truncated)
}
