use std::io;
use std::path::PathBuf;

/// Failure to assemble or enumerate an ephemeral workspace.
///
/// Any directory created before the failure has already been removed when
/// one of these reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to create temp directory in {}: {source}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to hard-link {name} into {}: {source}", .root.display())]
    Link {
        name: String,
        root: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write live buffer for {name}: {source}")]
    WriteLive {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid workspace entry name {name:?}: entries must be plain file names")]
    InvalidName { name: String },
    #[error("failed to list sibling files in {}: {source}", .dir.display())]
    ListSiblings {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}
