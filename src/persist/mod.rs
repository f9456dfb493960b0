//! Human-readable on-disk formats shared by every persisted component.

pub mod hyper_params;
pub mod tsv;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub use hyper_params::{HyperParams, HYPER_PARAMS_FILE};

pub(crate) fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

/// Removes `dir` and everything under it. A missing `dir` is not an error.
pub(crate) fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(Error::io(dir, e)),
        _ => Ok(()),
    }
}

/// Deletes entries `<prefix><n><suffix>` of `dir` with `n > keep`, left over
/// from an earlier, larger write into the same directory.
pub(crate) fn remove_numbered_entries_after(dir: &Path, prefix: &str, suffix: &str, keep: usize) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let index = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(prefix))
            .and_then(|rest| rest.strip_suffix(suffix))
            .and_then(|n| n.parse::<usize>().ok());
        if matches!(index, Some(n) if n > keep) {
            if path.is_dir() {
                remove_dir_if_present(&path)?;
            } else {
                std::fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
            }
        }
    }
    Ok(())
}

/// Entries of `dir` named `<prefix><n><suffix>`, sorted by `n` rather than
/// lexicographically so that `10` comes after `9`.
pub(crate) fn numbered_entries(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<(usize, PathBuf)>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let index = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .and_then(|n| n.parse::<usize>().ok());
        if let Some(index) = index {
            found.push((index, entry.path()));
        }
    }
    found.sort_by_key(|(index, _)| *index);

    for (expected, (index, _)) in (1..).zip(&found) {
        if *index != expected {
            return Err(Error::format(
                dir,
                format!("expected `{prefix}{expected}{suffix}`, found `{prefix}{index}{suffix}`"),
            ));
        }
    }
    Ok(found)
}
