//! Utility functions for cross-platform path handling

use crate::core::error::{MpResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
/// This function converts backslashes to forward slashes for use in Git commands.
pub fn path_to_git_format(path: &Path) -> String {
  // On Windows, convert backslashes to forward slashes
  // On Unix, this is a no-op since paths already use forward slashes
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// Files directly inside `dir` with the given extension, sorted by name
///
/// A missing directory yields an empty list.
pub fn files_with_extension(dir: &Path, extension: &str) -> MpResult<Vec<PathBuf>> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut files = Vec::new();
  for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
    let path = entry?.path();
    if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

/// Subdirectories of `dir` that contain `marker`, sorted by name
pub fn dirs_containing(dir: &Path, marker: &str) -> MpResult<Vec<PathBuf>> {
  if !dir.is_dir() {
    return Ok(Vec::new());
  }

  let mut dirs = Vec::new();
  for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
    let path = entry?.path();
    if path.is_dir() && path.join(marker).is_file() {
      dirs.push(path);
    }
  }
  dirs.sort();
  Ok(dirs)
}

/// Copy a file, creating the destination's parent directories
pub fn copy_file(from: &Path, to: &Path) -> MpResult<()> {
  if let Some(parent) = to.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }
  fs::copy(from, to).with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
  Ok(())
}
