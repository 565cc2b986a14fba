use metalint_ephemeral::WorkspaceError;
use metalint_process::LaunchError;

/// A lint pass that could not produce a diagnostic set.
///
/// Skips (unsaved buffer, too many files) are not errors; see
/// [`crate::LintOutcome::Skipped`].
#[derive(Debug, thiserror::Error)]
pub enum LintError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
