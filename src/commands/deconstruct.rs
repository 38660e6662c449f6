//! `mp deconstruct`: built artifacts -> non-built sources

use crate::core::context::RepoContext;
use crate::core::error::{ConfigError, MpError, MpResult, ResultExt};
use crate::metadata::integration::IntegrationMetadata;
use std::fs;
use std::path::{Path, PathBuf};

/// Run the deconstruct command
pub fn run_deconstruct(name: String, out: Option<PathBuf>) -> MpResult<()> {
  let cwd = std::env::current_dir()?;
  let ctx = RepoContext::build(&cwd)?;

  let built_dir = ctx.built_dir(&name);
  if !built_dir.is_dir() {
    return Err(MpError::Config(ConfigError::IntegrationNotFound {
      name,
      root: ctx.built_root(),
    }));
  }

  let out_dir = match out {
    Some(dir) if dir.is_absolute() => dir,
    Some(dir) => cwd.join(dir),
    None => ctx.source_root().join(&name),
  };
  if !is_empty_or_missing(&out_dir)? {
    return Err(MpError::with_help(
      format!("Refusing to overwrite non-empty directory {}", out_dir.display()),
      "Pass --out with an empty or new directory",
    ));
  }

  let metadata = IntegrationMetadata::from_built_path(&built_dir)?;
  metadata.write_non_built(&built_dir, &out_dir)?;

  println!("✅ Deconstructed {} → {}", name, out_dir.display());
  println!("   {} action(s), {} release note(s)", metadata.actions.len(), metadata.release_notes.len());
  Ok(())
}

fn is_empty_or_missing(dir: &Path) -> MpResult<bool> {
  if !dir.exists() {
    return Ok(true);
  }
  let mut entries = fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
  Ok(entries.next().is_none())
}
