//! `mp package`: rebuild a released integration archive from git history

use crate::core::context::RepoContext;
use crate::core::error::{MpError, MpResult};
use crate::metadata::version::IntegrationVersion;
use crate::release::{PackageRequest, Packager, RestoreReport};
use std::path::PathBuf;

/// Run the package command
pub fn run_package(
  integration: String,
  version: String,
  dir: Option<PathBuf>,
  raise_python_migration_rn: bool,
  json: bool,
) -> MpResult<()> {
  let cwd = std::env::current_dir()?;

  // Arguments are checked before any git command runs
  let explicit = match dir {
    Some(dir) => {
      let out_dir = if dir.is_absolute() { dir } else { cwd.join(dir) };
      Some(PackageRequest::new(&integration, &version, &out_dir, raise_python_migration_rn)?)
    }
    None => {
      version.parse::<IntegrationVersion>()?;
      None
    }
  };

  let ctx = RepoContext::build(&cwd)?;
  let mut request = match explicit {
    Some(request) => request,
    // The archive defaults to the repository root, wherever mp runs from
    None => PackageRequest::new(&integration, &version, &ctx.root, raise_python_migration_rn)?,
  };
  request.require_release_notes |= ctx.config.package.require_release_notes;

  if !json {
    println!("📦 Packaging {} v{}", request.integration, request.version);
  }

  let packager = Packager::new(
    ctx.vcs.as_ref(),
    ctx.config.paths.built.clone(),
    ctx.config.git.remote.clone(),
  );

  match packager.package(&request) {
    Ok(report) => {
      if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
      } else {
        println!("   Commit:  {}", report.commit);
        println!("   Files:   {}", report.archive.files);
        println!("   SHA-256: {}", report.archive.sha256);
        println!("✅ Wrote {}", report.archive.path.display());
      }

      if !report.restore.is_complete() {
        return Err(restore_incomplete(&report.restore));
      }
      Ok(())
    }
    Err(failure) => {
      if let Some(restore) = failure.restore.as_ref().filter(|r| !r.is_complete()) {
        eprintln!("⚠️  Working tree not fully restored:");
        for line in &restore.failures {
          eprintln!("   - {}", line);
        }
        eprintln!("   Recover with: {}", restore.recovery_hint());
      }
      Err(failure.error)
    }
  }
}

fn restore_incomplete(restore: &RestoreReport) -> MpError {
  MpError::RestoreIncomplete {
    failures: restore.failures.clone(),
    hint: restore.recovery_hint(),
  }
}
