//! Version bump policy
//!
//! Loading happens first (and fails loudly on malformed files); the policy itself
//! is a pure comparison over two snapshots:
//!
//! - existing integration: `new - old == 1.0`, every release note added since the
//!   base carries the new version
//! - new integration: version `1.0`, every release note at `1.0`

use crate::core::error::{MpError, MpResult, ValidationError};
use crate::core::vcs::VersionControl;
use crate::metadata::SequentialMetadata;
use crate::metadata::integration::RELEASE_NOTES_FILE;
use crate::metadata::manifest::{IntegrationManifest, MANIFEST_FILE};
use crate::metadata::release_note::ReleaseNote;
use crate::metadata::version::IntegrationVersion;
use std::path::Path;

pub const INCREMENT_MESSAGE: &str = "must be incremented by exactly 1.0";
pub const RELEASE_NOTE_MISMATCH_MESSAGE: &str = "the release note's version must match the integration version";
pub const INITIAL_VERSION_MESSAGE: &str = "must initialize to 1.0";

/// Versions are decimals with one meaningful fraction digit; anything closer is equal
const VERSION_TOLERANCE: f64 = 1e-9;

/// Manifest and release notes of one integration at one point in history
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSnapshot {
  pub manifest: IntegrationManifest,
  pub release_notes: Vec<ReleaseNote>,
}

/// The bump check for one integration
#[derive(Debug, Clone)]
pub struct VersionBumpCheck {
  pub integration: String,
  /// State on the base branch; `None` when the integration is new
  pub old: Option<VersionSnapshot>,
  pub new: VersionSnapshot,
}

impl VersionBumpCheck {
  pub fn run(&self) -> Result<(), ValidationError> {
    match &self.old {
      Some(old) => self.check_existing(old),
      None => self.check_new(),
    }
  }

  fn check_existing(&self, old: &VersionSnapshot) -> Result<(), ValidationError> {
    let old_version = old.manifest.version();
    let new_version = self.new.manifest.version();
    let delta = new_version.delta_from(old_version);

    if (delta - 1.0).abs() > VERSION_TOLERANCE {
      return Err(self.violation(format!(
        "version {} {} (was {} on the base branch)",
        new_version, INCREMENT_MESSAGE, old_version
      )));
    }

    for note in self.new.release_notes.iter().filter(|n| !old.release_notes.contains(n)) {
      if note.version != new_version {
        return Err(self.violation(format!(
          "{} ({} for '{}', expected {})",
          RELEASE_NOTE_MISMATCH_MESSAGE, note.version, note.item_name, new_version
        )));
      }
    }
    Ok(())
  }

  fn check_new(&self) -> Result<(), ValidationError> {
    let version = self.new.manifest.version();
    if version != IntegrationVersion::INITIAL {
      return Err(self.violation(format!(
        "a new integration's version {} (found {})",
        INITIAL_VERSION_MESSAGE, version
      )));
    }

    if let Some(note) = self
      .new
      .release_notes
      .iter()
      .find(|n| n.version != IntegrationVersion::INITIAL)
    {
      return Err(self.violation(format!(
        "a new integration's release notes {} ({} for '{}')",
        INITIAL_VERSION_MESSAGE, note.version, note.item_name
      )));
    }
    Ok(())
  }

  fn violation(&self, message: String) -> ValidationError {
    ValidationError::VersionBump {
      integration: self.integration.clone(),
      message,
    }
  }
}

/// Read the snapshot of `integration_dir` (repository-relative) on `base_ref`
///
/// A manifest that never existed on the base means the integration is new. Missing
/// release notes on an existing integration count as an empty document.
pub fn snapshot_at(
  vcs: &dyn VersionControl,
  base_ref: &str,
  integration_dir: &Path,
) -> MpResult<Option<VersionSnapshot>> {
  let manifest = match vcs.read_file_at(base_ref, &integration_dir.join(MANIFEST_FILE)) {
    Ok(text) => IntegrationManifest::from_pyproject_str(&text)?,
    Err(e) if is_missing_file(&e) => {
      tracing::debug!(dir = %integration_dir.display(), base_ref, "no manifest on base, treating as new");
      return Ok(None);
    }
    Err(e) => return Err(e),
  };

  let release_notes = match vcs.read_file_at(base_ref, &integration_dir.join(RELEASE_NOTES_FILE)) {
    Ok(text) => ReleaseNote::from_non_built_list_str(&text)?,
    Err(e) if is_missing_file(&e) => Vec::new(),
    Err(e) => return Err(e),
  };

  Ok(Some(VersionSnapshot {
    manifest,
    release_notes,
  }))
}

/// `FileNotFoundOnBranch`, the one git failure that is an expected state
fn is_missing_file(err: &MpError) -> bool {
  matches!(err, MpError::Git(g) if g.is_non_fatal())
}
