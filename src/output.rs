//! Writing a generated file map to disk, and reading one back for refinement.
//!
//! The engine emits paths prefixed with `<project_name>/`; the writer strips
//! that prefix so the caller's chosen output root becomes the project root.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Write every file in the map under `out_dir`, stripping the
/// `<project_name>/` prefix. Returns the number of files written.
pub fn write_project(
    files: &BTreeMap<String, String>,
    project_name: &str,
    out_dir: &Path,
) -> Result<usize> {
    let prefix = format!("{project_name}/");
    let mut written = 0;
    for (path, content) in files {
        let relative = path.strip_prefix(&prefix).unwrap_or(path);
        let relative = safe_relative(relative)?;
        let full_path = out_dir.join(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&full_path, content)
            .with_context(|| format!("write {}", full_path.display()))?;
        written += 1;
    }
    tracing::info!(written, out_dir = %out_dir.display(), "project written");
    Ok(written)
}

/// Read an on-disk project back into a path → content map, with paths
/// relative to `dir`. Used to assemble the current state for refinement.
pub fn read_project(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current)
            .with_context(|| format!("read directory {}", current.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read entry in {}", current.display()))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let relative = path
                    .strip_prefix(dir)
                    .with_context(|| format!("relativize {}", path.display()))?;
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?;
                files.insert(relative.to_string_lossy().replace('\\', "/"), content);
            }
        }
    }
    Ok(files)
}

/// Reject paths that would escape the output root.
fn safe_relative(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    for component in candidate.components() {
        match component {
            Component::Normal(_) => {}
            _ => bail!("refusing unsafe output path {path:?}"),
        }
    }
    if path.is_empty() {
        bail!("refusing empty output path");
    }
    Ok(candidate.to_path_buf())
}
