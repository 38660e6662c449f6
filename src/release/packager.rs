//! Release packager
//!
//! Rebuilds the archive of a released integration version from git history:
//!
//! ```text
//! locate   git log --all -S '"Version": <v>' -- <built>/<id>/Integration-<id>.def
//! checkout record branch, stash, clean, fetch --all, checkout <sha>
//! validate definition Version == <v>, release notes present (optional)
//! mutate   IsCustom = true
//! package  <dir>/<id>_V<v-dashed>.zip
//! restore  git restore <def>, checkout <branch>, stash pop   (always)
//! ```
//!
//! Restoration is owned by [`CheckoutGuard`]: once acquired, every exit path
//! restores the working tree. Restore failures are collected, never raised, so
//! they cannot mask the packaging result.

use super::archive::{ArchiveSummary, archive_name, zip_directory};
use crate::core::error::{ConfigError, GitError, MpError, MpResult, ResultExt, ValidationError};
use crate::core::vcs::{CommitRef, VersionControl};
use crate::metadata::integration::{BUILT_RELEASE_NOTES_FILE, built_definition_file_name};
use crate::metadata::release_note::ReleaseNote;
use crate::metadata::version::IntegrationVersion;
use crate::metadata::{SequentialMetadata, write_built};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// A validated packaging request
#[derive(Debug, Clone)]
pub struct PackageRequest {
  pub integration: String,
  pub version: IntegrationVersion,
  /// Existing directory the archive is written to
  pub out_dir: PathBuf,
  pub require_release_notes: bool,
}

impl PackageRequest {
  /// Check arguments that must be right before any git command runs
  pub fn new(integration: &str, version: &str, out_dir: &Path, require_release_notes: bool) -> MpResult<Self> {
    let version: IntegrationVersion = version.parse()?;
    if !out_dir.is_dir() {
      return Err(MpError::Config(ConfigError::OutputDirMissing {
        path: out_dir.to_path_buf(),
      }));
    }
    let out_dir = fs::canonicalize(out_dir).with_context(|| format!("Failed to resolve {}", out_dir.display()))?;
    Ok(Self {
      integration: integration.to_string(),
      version,
      out_dir,
      require_release_notes,
    })
  }
}

/// What happened while putting the working tree back
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
  /// Branch name, or commit SHA when HEAD was detached
  pub original: String,
  pub stash_popped: bool,
  pub failures: Vec<String>,
}

impl RestoreReport {
  pub fn is_complete(&self) -> bool {
    self.failures.is_empty()
  }

  /// Commands that finish the restoration by hand
  pub fn recovery_hint(&self) -> String {
    let mut hint = format!("git checkout {}", self.original);
    if self.failures.iter().any(|f| f.starts_with("stash pop")) {
      hint.push_str(" && git stash pop");
    }
    hint
  }
}

/// Successful packaging
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
  pub integration: String,
  pub version: String,
  pub commit: String,
  pub archive: ArchiveSummary,
  pub restore: RestoreReport,
}

/// Failed packaging, with the restoration outcome when a checkout had started
#[derive(Debug)]
pub struct PackageFailure {
  pub error: MpError,
  pub restore: Option<RestoreReport>,
}

impl From<MpError> for PackageFailure {
  fn from(error: MpError) -> Self {
    Self { error, restore: None }
  }
}

/// Restores the working tree on every exit path
///
/// Call [`CheckoutGuard::restore`] to get the report; dropping an unrestored guard
/// restores anyway and logs the outcome.
pub struct CheckoutGuard<'a> {
  vcs: &'a dyn VersionControl,
  original: String,
  stashed: bool,
  moved: bool,
  mutated: Vec<PathBuf>,
  restored: bool,
}

impl<'a> CheckoutGuard<'a> {
  /// Record where HEAD is now
  pub fn acquire(vcs: &'a dyn VersionControl) -> MpResult<Self> {
    let original = match vcs.current_branch()? {
      Some(branch) => branch,
      None => vcs.head_commit()?,
    };
    tracing::debug!(original = %original, "recorded original checkout");
    Ok(Self {
      vcs,
      original,
      stashed: false,
      moved: false,
      mutated: Vec::new(),
      restored: false,
    })
  }

  /// Stash, clean and check out `commit`, fetching it explicitly if no local ref has it
  pub fn checkout(&mut self, commit: &CommitRef, remote: &str, keep: &[PathBuf]) -> MpResult<()> {
    if self.vcs.has_uncommitted_changes()? {
      self.stashed = self.vcs.stash()?;
    }
    self.vcs.clean_untracked(keep)?;
    self.vcs.fetch_all()?;

    self.moved = true;
    if let Err(e) = self.vcs.checkout(commit.sha()) {
      tracing::debug!(error = %e, sha = %commit, "checkout failed, fetching commit explicitly");
      self.vcs.fetch_commit(remote, commit)?;
      self.vcs.checkout(commit.sha())?;
    }
    tracing::info!(sha = %commit.short(), "checked out release commit");
    Ok(())
  }

  /// Register a file about to be modified so restoration discards the change
  pub fn track_mutation(&mut self, path: &Path) {
    self.mutated.push(path.to_path_buf());
  }

  /// Undo everything; each step runs regardless of the others
  pub fn restore(mut self) -> RestoreReport {
    self.restore_in_place()
  }

  fn restore_in_place(&mut self) -> RestoreReport {
    self.restored = true;
    let mut report = RestoreReport {
      original: self.original.clone(),
      ..Default::default()
    };

    for path in &self.mutated {
      if let Err(e) = self.vcs.restore(path) {
        report.failures.push(format!("restore {}: {}", path.display(), e));
      }
    }

    if self.moved
      && let Err(e) = self.vcs.checkout(&self.original)
    {
      report.failures.push(format!("checkout {}: {}", self.original, e));
    }

    if self.stashed {
      match self.vcs.stash_pop() {
        Ok(()) => report.stash_popped = true,
        Err(e) => report.failures.push(format!("stash pop: {}", e)),
      }
    }

    if report.is_complete() {
      tracing::debug!(original = %report.original, "working tree restored");
    } else {
      tracing::warn!(failures = report.failures.len(), hint = %report.recovery_hint(), "working tree restore incomplete");
    }
    report
  }
}

impl Drop for CheckoutGuard<'_> {
  fn drop(&mut self) {
    if !self.restored {
      self.restore_in_place();
    }
  }
}

/// Packages released integration versions out of git history
pub struct Packager<'a> {
  vcs: &'a dyn VersionControl,
  /// Built integrations directory, relative to the work tree
  built_root: PathBuf,
  remote: String,
}

impl<'a> Packager<'a> {
  pub fn new(vcs: &'a dyn VersionControl, built_root: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
    Self {
      vcs,
      built_root: built_root.into(),
      remote: remote.into(),
    }
  }

  fn definition_path(&self, integration: &str) -> PathBuf {
    self
      .built_root
      .join(integration)
      .join(built_definition_file_name(integration))
  }

  pub fn package(&self, request: &PackageRequest) -> Result<PackageReport, PackageFailure> {
    let definition = self.definition_path(&request.integration);
    let version = request.version.to_string();

    let commit = self
      .vcs
      .find_commit_introducing(&definition, &version)?
      .ok_or_else(|| {
        MpError::Git(GitError::VersionNotFound {
          integration: request.integration.clone(),
          version: version.clone(),
        })
      })?;
    tracing::info!(integration = %request.integration, version = %version, sha = %commit.short(), "found release commit");

    let mut guard = CheckoutGuard::acquire(self.vcs)?;
    let packaged = self.package_at(&mut guard, &commit, request);
    let restore = guard.restore();

    match packaged {
      Ok(archive) => Ok(PackageReport {
        integration: request.integration.clone(),
        version,
        commit: commit.sha().to_string(),
        archive,
        restore,
      }),
      Err(error) => Err(PackageFailure {
        error,
        restore: Some(restore),
      }),
    }
  }

  fn package_at(
    &self,
    guard: &mut CheckoutGuard<'_>,
    commit: &CommitRef,
    request: &PackageRequest,
  ) -> MpResult<ArchiveSummary> {
    let work_tree = self.vcs.work_tree();
    let keep: Vec<PathBuf> = relative_to(work_tree, &request.out_dir).into_iter().collect();
    guard.checkout(commit, &self.remote, &keep)?;

    let definition_rel = self.definition_path(&request.integration);
    let definition_abs = work_tree.join(&definition_rel);
    let integration_dir = work_tree.join(&self.built_root).join(&request.integration);

    let mut definition = self.read_definition(&definition_abs, request)?;
    self.check_version(&definition, request)?;
    if request.require_release_notes {
      self.check_release_notes(&integration_dir, request)?;
    }

    guard.track_mutation(&definition_rel);
    mark_custom(&mut definition)?;
    write_built(&definition_abs, &definition)?;
    tracing::debug!(definition = %definition_rel.display(), "marked definition as custom");

    let dest = request
      .out_dir
      .join(archive_name(&request.integration, request.version));
    let archive = zip_directory(&integration_dir, &dest)?;
    tracing::info!(archive = %archive.path.display(), files = archive.files, sha256 = %archive.sha256, "wrote archive");
    Ok(archive)
  }

  fn read_definition(&self, path: &Path, request: &PackageRequest) -> MpResult<Value> {
    if !path.is_file() {
      return Err(package_error(request, format!("{} does not exist at the release commit", path.display())));
    }
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| package_error(request, format!("{} is not valid JSON: {}", path.display(), e)))
  }

  fn check_version(&self, definition: &Value, request: &PackageRequest) -> MpResult<()> {
    let declared = definition.get("Version").and_then(Value::as_f64);
    if declared != Some(request.version.value()) {
      let found = definition
        .get("Version")
        .map(Value::to_string)
        .unwrap_or_else(|| "nothing".to_string());
      return Err(package_error(
        request,
        format!("definition declares version {}, expected {}", found, request.version),
      ));
    }
    Ok(())
  }

  fn check_release_notes(&self, integration_dir: &Path, request: &PackageRequest) -> MpResult<()> {
    let path = integration_dir.join(BUILT_RELEASE_NOTES_FILE);
    let notes = if path.is_file() {
      ReleaseNote::from_built_file(&path)?
    } else {
      Vec::new()
    };
    if notes.is_empty() {
      return Err(package_error(request, format!("{} has no release notes", BUILT_RELEASE_NOTES_FILE)));
    }
    Ok(())
  }
}

fn package_error(request: &PackageRequest, message: String) -> MpError {
  MpError::Validation(ValidationError::Package {
    integration: request.integration.clone(),
    message,
  })
}

fn mark_custom(definition: &mut Value) -> MpResult<()> {
  let object = definition
    .as_object_mut()
    .ok_or_else(|| MpError::message("integration definition is not a JSON object"))?;
  object.insert("IsCustom".to_string(), Value::Bool(true));
  Ok(())
}

/// `path` relative to `root` when it lives inside it
fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
  let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
  path
    .strip_prefix(&root)
    .ok()
    .filter(|rel| !rel.as_os_str().is_empty())
    .map(Path::to_path_buf)
}
