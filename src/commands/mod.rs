//! CLI commands for mp
//!
//! - **build**: non-built integration sources -> built artifacts
//! - **deconstruct**: built artifacts -> non-built sources
//! - **validate**: structural checks and version bump policy, batch and parallel
//! - **package**: rebuild a released version's archive from git history
//!
//! Each command builds its own `RepoContext`, so argument errors surface before
//! the repository is touched.

pub mod build;
pub mod deconstruct;
pub mod package;
pub mod validate;

pub use build::run_build;
pub use deconstruct::run_deconstruct;
pub use package::run_package;
pub use validate::run_validate;

use crate::core::context::RepoContext;
use crate::core::error::{MpError, MpResult};

/// Resolve positional names / `--all` into a sorted, de-duplicated list
pub(crate) fn select_integrations(ctx: &RepoContext, names: Vec<String>, all: bool) -> MpResult<Vec<String>> {
  if all {
    return ctx.all_integrations();
  }
  if names.is_empty() {
    return Err(MpError::with_help(
      "No integrations selected",
      "Pass integration names, or --all for every integration",
    ));
  }
  let mut names = names;
  names.sort();
  names.dedup();
  for name in &names {
    ctx.source_dir(name)?;
  }
  Ok(names)
}
