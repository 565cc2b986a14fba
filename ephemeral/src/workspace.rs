//! Hard-link workspace construction and teardown.

use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::WorkspaceError;

/// Name prefix for workspace directories; the leading dot keeps them out of
/// normal listings and out of the aggregator's own package discovery.
pub const WORKSPACE_PREFIX: &str = ".metalint-";

/// A populated temporary directory living for one lint invocation.
///
/// Invariants:
/// - `root` is a fresh, uniquely named directory directly inside the source
///   directory (same filesystem, so links never copy).
/// - Every entry except `live_file` is a hard link to the sibling of the same
///   name.
/// - `live_file` is a regular file holding exactly the buffer bytes.
///
/// Dropping the handle deletes the directory recursively; [`release`] does
/// the same and reports failure. Removing a link never touches the sibling.
///
/// [`release`]: EphemeralWorkspace::release
#[derive(Debug)]
pub struct EphemeralWorkspace {
    dir: TempDir,
    entries: BTreeSet<String>,
    live_file: String,
}

fn validate_name(name: &str) -> Result<(), WorkspaceError> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|n| n == name);
    if plain {
        Ok(())
    } else {
        Err(WorkspaceError::InvalidName {
            name: name.to_string(),
        })
    }
}

impl EphemeralWorkspace {
    /// Build a workspace in `source_dir`.
    ///
    /// `siblings` are basenames of files in `source_dir` to link in; the one
    /// equal to `edited` is skipped and replaced by `live_content`. `edited`
    /// is written even when it is not among `siblings` (a buffer not yet on
    /// disk). Hard-link failure is fatal; there is no copy fallback.
    pub fn build<I, S>(
        source_dir: &Path,
        siblings: I,
        edited: &str,
        live_content: &[u8],
    ) -> Result<Self, WorkspaceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        validate_name(edited)?;
        let siblings: BTreeSet<String> = siblings
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        for name in &siblings {
            validate_name(name)?;
        }

        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(source_dir)
            .map_err(|source| WorkspaceError::CreateDir {
                dir: source_dir.to_path_buf(),
                source,
            })?;

        match populate(source_dir, dir.path(), &siblings, edited, live_content) {
            Ok(entries) => {
                tracing::debug!(
                    root = %dir.path().display(),
                    linked = entries.len() - 1,
                    "Ephemeral workspace ready"
                );
                Ok(Self {
                    dir,
                    entries,
                    live_file: edited.to_string(),
                })
            }
            Err(err) => {
                let root = dir.path().to_path_buf();
                if let Err(e) = dir.close() {
                    tracing::warn!(
                        root = %root.display(),
                        "Failed to remove partial workspace: {e}"
                    );
                }
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Basenames present in the workspace, including the live file.
    #[must_use]
    pub fn entries(&self) -> &BTreeSet<String> {
        &self.entries
    }

    /// Path of the file materialized from the live buffer.
    #[must_use]
    pub fn live_file(&self) -> PathBuf {
        self.dir.path().join(&self.live_file)
    }

    /// Delete the workspace now, reporting any failure.
    pub fn release(self) -> io::Result<()> {
        let root = self.dir.path().to_path_buf();
        let result = self.dir.close();
        if result.is_ok() {
            tracing::trace!(root = %root.display(), "Ephemeral workspace removed");
        }
        result
    }
}

fn populate(
    source_dir: &Path,
    root: &Path,
    siblings: &BTreeSet<String>,
    edited: &str,
    live_content: &[u8],
) -> Result<BTreeSet<String>, WorkspaceError> {
    let mut entries = BTreeSet::new();

    for name in siblings.iter().filter(|name| name.as_str() != edited) {
        fs::hard_link(source_dir.join(name), root.join(name)).map_err(|source| {
            WorkspaceError::Link {
                name: name.clone(),
                root: root.to_path_buf(),
                source,
            }
        })?;
        entries.insert(name.clone());
    }

    let write_live = || -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(root.join(edited))?;
        file.write_all(live_content)?;
        file.flush()
    };
    write_live().map_err(|source| WorkspaceError::WriteLive {
        name: edited.to_string(),
        source,
    })?;
    entries.insert(edited.to_string());

    Ok(entries)
}
