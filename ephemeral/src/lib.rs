//! Ephemeral workspaces for linting unsaved buffers.
//!
//! An external tool that only reads files from disk is pointed at a temporary
//! directory next to the real sources. Every sibling is hard-linked in
//! (zero-copy, same inode), and the edited file is materialized from the live
//! buffer. The directory is removed when the handle is released or dropped.

mod error;
mod siblings;
mod workspace;

pub use error::WorkspaceError;
pub use siblings::list_siblings;
pub use workspace::{EphemeralWorkspace, WORKSPACE_PREFIX};
