//! Batch validation of non-built integrations
//!
//! Each integration is loaded (structural validation of every entity) and then
//! passed through the version bump policy. Validation failures are recorded per
//! integration and never stop the batch; environment failures (git, I/O) do.

pub mod version_bump;

use crate::core::context::RepoContext;
use crate::core::error::{MpError, MpResult};
use crate::metadata::integration::IntegrationMetadata;
use crate::metadata::manifest::{IntegrationManifest, MANIFEST_FILE};
use rayon::prelude::*;
use serde::Serialize;
use version_bump::{VersionBumpCheck, VersionSnapshot, snapshot_at};

/// Outcome for one integration
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationReport {
  pub integration: String,
  pub version: Option<String>,
  /// Version on the base branch, `None` for new integrations or when loading failed
  pub base_version: Option<String>,
  pub errors: Vec<String>,
}

impl IntegrationReport {
  fn new(integration: &str) -> Self {
    Self {
      integration: integration.to_string(),
      version: None,
      base_version: None,
      errors: Vec::new(),
    }
  }

  pub fn is_ok(&self) -> bool {
    self.errors.is_empty()
  }

  /// Record a non-fatal error, or hand a fatal one back to the caller
  fn absorb(&mut self, err: MpError) -> MpResult<()> {
    if err.is_non_fatal() {
      tracing::debug!(integration = %self.integration, error = %err, "validation failed");
      self.errors.push(err.to_string());
      Ok(())
    } else {
      Err(err)
    }
  }
}

/// Validate one integration against `base_ref`
pub fn validate_integration(ctx: &RepoContext, name: &str, base_ref: &str) -> MpResult<IntegrationReport> {
  let mut report = IntegrationReport::new(name);
  let dir = ctx.source_dir(name)?;

  let metadata = match IntegrationMetadata::from_non_built_path(&dir) {
    Ok(metadata) => metadata,
    Err(e) => {
      report.absorb(e)?;
      return Ok(report);
    }
  };

  let manifest = IntegrationManifest::load(&dir.join(MANIFEST_FILE))?;
  report.version = Some(manifest.version().to_string());
  let new = VersionSnapshot {
    manifest,
    release_notes: metadata.release_notes,
  };

  let relative = ctx.config.paths.source.join(name);
  let old = match snapshot_at(ctx.vcs.as_ref(), base_ref, &relative) {
    Ok(old) => old,
    Err(e) => {
      report.absorb(e)?;
      return Ok(report);
    }
  };
  report.base_version = old.as_ref().map(|s| s.manifest.version().to_string());

  let check = VersionBumpCheck {
    integration: name.to_string(),
    old,
    new,
  };
  if let Err(e) = check.run() {
    report.absorb(e.into())?;
  }
  Ok(report)
}

/// Validate `names` in parallel; `on_done` runs after each integration finishes
pub fn validate_all<F>(ctx: &RepoContext, names: &[String], base_ref: &str, on_done: F) -> MpResult<Vec<IntegrationReport>>
where
  F: Fn(&IntegrationReport) + Sync,
{
  names
    .par_iter()
    .map(|name| -> MpResult<IntegrationReport> {
      let report = validate_integration(ctx, name, base_ref)?;
      on_done(&report);
      Ok(report)
    })
    .collect()
}
