use std::fs;
use std::path::Path;

use crate::error::WorkspaceError;

/// Basenames of the regular files in `dir` with extension `extension`, sorted.
///
/// Directories (including other passes' workspaces) and symlinks are
/// excluded, as are names that are not valid UTF-8.
pub fn list_siblings(dir: &Path, extension: &str) -> Result<Vec<String>, WorkspaceError> {
    let list_err = |source| WorkspaceError::ListSiblings {
        dir: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if !entry.file_type().map_err(list_err)?.is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
