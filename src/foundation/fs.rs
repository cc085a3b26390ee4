//! Directory subtree helpers for scenario/test setup.
//!
//! A scenario owns its output directory exclusively and recreates it before
//! use, so removal must cope with leftovers from a previous run and be a
//! no-op when there is nothing to remove.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::VignetteResult;

/// Create `dir` and any missing ancestors.
pub fn ensure_dir(dir: &Path) -> VignetteResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
    Ok(())
}

/// Remove a directory subtree, depth-first.
///
/// Contents of a subdirectory are deleted before the subdirectory itself.
/// A `root` that does not exist (or is not a directory) is a no-op, so
/// repeated removal is safe.
pub fn remove_tree(root: &Path) -> VignetteResult<()> {
    if !root.is_dir() {
        return Ok(());
    }
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("failed to read directory '{}'", root.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to list directory '{}'", root.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to stat '{}'", path.display()))?;
        if file_type.is_dir() {
            remove_tree(&path)?;
        } else {
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove file '{}'", path.display()))?;
        }
    }
    std::fs::remove_dir(root)
        .with_context(|| format!("failed to remove directory '{}'", root.display()))?;
    Ok(())
}

/// Destroy-then-create: guarantee `dir` exists and is empty.
pub fn fresh_dir(dir: &Path) -> VignetteResult<()> {
    remove_tree(dir)?;
    ensure_dir(dir)
}
