//! Repository context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   RepoContext::build() -> &RepoContext
//!   |
//!   v
//! commands/build.rs, validate.rs, package.rs:
//!   fn run(ctx: &RepoContext, ...)
//! ```

use crate::core::config::MpConfig;
use crate::core::error::{ConfigError, MpError, MpResult};
use crate::core::vcs::{SystemGit, VersionControl};
use crate::metadata::manifest::MANIFEST_FILE;
use crate::utils;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Repository-level data shared by every command
#[derive(Clone)]
pub struct RepoContext {
  /// Repository root (git work tree)
  pub root: PathBuf,

  /// mp.toml, or defaults
  pub config: Arc<MpConfig>,

  /// Git backend, shared across validation threads
  pub vcs: Arc<dyn VersionControl>,
}

impl RepoContext {
  /// Open the repository containing `start` and load its configuration
  pub fn build(start: &Path) -> MpResult<Self> {
    let git = SystemGit::open(start)?;
    let root = git.work_tree().to_path_buf();
    let config = MpConfig::load(&root)?;
    Ok(Self::with_parts(root, config, Arc::new(git)))
  }

  pub fn with_parts(root: PathBuf, config: MpConfig, vcs: Arc<dyn VersionControl>) -> Self {
    Self {
      root,
      config: Arc::new(config),
      vcs,
    }
  }

  /// Absolute directory holding non-built integrations
  pub fn source_root(&self) -> PathBuf {
    self.root.join(&self.config.paths.source)
  }

  /// Absolute directory holding built integrations
  pub fn built_root(&self) -> PathBuf {
    self.root.join(&self.config.paths.built)
  }

  /// Non-built integration directory for `name`, which must exist
  pub fn source_dir(&self, name: &str) -> MpResult<PathBuf> {
    let dir = self.source_root().join(name);
    if !dir.join(MANIFEST_FILE).is_file() {
      return Err(MpError::Config(ConfigError::IntegrationNotFound {
        name: name.to_string(),
        root: self.source_root(),
      }));
    }
    Ok(dir)
  }

  /// Built integration directory for `name` (may not exist yet)
  pub fn built_dir(&self, name: &str) -> PathBuf {
    self.built_root().join(name)
  }

  /// Names of every non-built integration, sorted
  pub fn all_integrations(&self) -> MpResult<Vec<String>> {
    Ok(
      utils::dirs_containing(&self.source_root(), MANIFEST_FILE)?
        .iter()
        .filter_map(|dir| dir.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect(),
    )
  }

  /// Integrations with at least one path changed relative to `base`
  pub fn changed_integrations(&self, base: &str) -> MpResult<Vec<String>> {
    let source = &self.config.paths.source;
    let all = self.all_integrations()?;
    let mut changed: Vec<String> = self
      .vcs
      .changed_paths(base)?
      .iter()
      .filter_map(|path| path.strip_prefix(source).ok())
      .filter_map(|rest| rest.components().next())
      .filter_map(|c| c.as_os_str().to_str().map(str::to_string))
      .filter(|name| all.contains(name))
      .collect();
    changed.sort();
    changed.dedup();
    Ok(changed)
  }
}
