//! VersionControl operations for SystemGit (history search, stash, checkout, etc.)

use super::system_git::{SystemGit, command_failed, is_missing_path};
use super::{CommitRef, VersionControl};
use crate::core::error::{GitError, MpError, MpResult};
use crate::utils::path_to_git_format;
use regex::Regex;
use std::path::{Path, PathBuf};

impl VersionControl for SystemGit {
  fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Search all refs with the pickaxe, then confirm the candidate actually adds the line
  ///
  /// `-S` also matches commits that remove the string, so each candidate's diff is
  /// checked for an added `"Version": <v>` line. Candidates arrive newest first.
  fn find_commit_introducing(&self, path: &Path, version: &str) -> MpResult<Option<CommitRef>> {
    let git_path = path_to_git_format(path);
    let needle = format!("\"Version\": {}", version);
    let candidates = self.run_stdout(&["log", "--all", "--format=%H", "-S", &needle, "--", &git_path])?;

    let added = added_version_line(version)?;
    for sha in candidates.lines().map(str::trim).filter(|s| !s.is_empty()) {
      let diff = self.run_stdout(&["show", "--format=", "--unified=0", sha, "--", &git_path])?;
      if added.is_match(&diff) {
        tracing::debug!(sha, path = %git_path, version, "found introducing commit");
        return Ok(Some(CommitRef::new(sha)));
      }
      tracing::debug!(sha, "pickaxe candidate does not add the version, skipping");
    }
    Ok(None)
  }

  fn current_branch(&self) -> MpResult<Option<String>> {
    let branch = self.run_stdout(&["rev-parse", "--abbrev-ref", "HEAD"])?;
    if branch == "HEAD" {
      return Ok(None); // Detached HEAD
    }
    Ok(Some(branch))
  }

  fn head_commit(&self) -> MpResult<String> {
    self.run_stdout(&["rev-parse", "HEAD"])
  }

  fn has_uncommitted_changes(&self) -> MpResult<bool> {
    let status = self.run_stdout(&["status", "--porcelain"])?;
    Ok(!status.is_empty())
  }

  /// `git stash push` exits 0 with "No local changes to save", so the stash list is compared instead
  fn stash(&self) -> MpResult<bool> {
    let before = self.stash_count()?;
    self.run(&["stash", "push", "--message", "mp package"])?;
    let created = self.stash_count()? > before;
    tracing::debug!(created, "stashed local changes");
    Ok(created)
  }

  fn stash_pop(&self) -> MpResult<()> {
    self.run(&["stash", "pop"])?;
    Ok(())
  }

  fn clean_untracked(&self, excludes: &[PathBuf]) -> MpResult<()> {
    // Anchored so only the excluded path itself is spared, not same-named dirs elsewhere
    let patterns: Vec<String> = excludes.iter().map(|p| format!("/{}", path_to_git_format(p))).collect();
    let mut args = vec!["clean", "-fd"];
    for pattern in &patterns {
      args.push("-e");
      args.push(pattern);
    }
    self.run(&args)?;
    Ok(())
  }

  fn fetch_all(&self) -> MpResult<()> {
    self.run(&["fetch", "--all"])?;
    Ok(())
  }

  fn fetch_commit(&self, remote: &str, commit: &CommitRef) -> MpResult<()> {
    let output = self.run_unchecked(&["fetch", remote, commit.sha()])?;
    if !output.status.success() {
      tracing::debug!(stderr = %String::from_utf8_lossy(&output.stderr), "fetch of single commit failed");
      return Err(MpError::Git(GitError::CommitNotFound {
        sha: commit.sha().to_string(),
      }));
    }
    Ok(())
  }

  fn checkout(&self, target: &str) -> MpResult<()> {
    self.run(&["checkout", target])?;
    Ok(())
  }

  fn restore(&self, path: &Path) -> MpResult<()> {
    self.run(&["restore", "--", &path_to_git_format(path)])?;
    Ok(())
  }

  fn read_file_at(&self, reference: &str, path: &Path) -> MpResult<String> {
    let git_path = path_to_git_format(path);
    let spec = format!("{}:{}", reference, git_path);
    let args = ["show", spec.as_str()];
    let output = self.run_unchecked(&args)?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if is_missing_path(&stderr) {
        return Err(MpError::Git(GitError::FileNotFoundOnBranch {
          path: path.to_path_buf(),
          reference: reference.to_string(),
        }));
      }
      return Err(command_failed(&args, &output));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  fn changed_paths(&self, base: &str) -> MpResult<Vec<PathBuf>> {
    let tracked = self.run_stdout(&["diff", "--name-only", base])?;
    let untracked = self.run_stdout(&["ls-files", "--others", "--exclude-standard"])?;

    let mut paths: Vec<PathBuf> = tracked
      .lines()
      .chain(untracked.lines())
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(PathBuf::from)
      .collect();
    paths.sort();
    paths.dedup();
    Ok(paths)
  }
}

impl SystemGit {
  fn stash_count(&self) -> MpResult<usize> {
    let list = self.run_stdout(&["stash", "list"])?;
    Ok(list.lines().filter(|l| !l.trim().is_empty()).count())
  }
}

/// Matches a diff line adding `"Version": <version>` (optionally followed by a comma)
fn added_version_line(version: &str) -> MpResult<Regex> {
  let pattern = format!(r#"(?m)^\+\s*"Version"\s*:\s*{}\s*,?\s*$"#, regex::escape(version));
  Regex::new(&pattern).map_err(|e| MpError::message(format!("Invalid version pattern: {}", e)))
}
