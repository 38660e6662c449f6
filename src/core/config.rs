use crate::core::error::{ConfigError, MpError, MpResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for mp
/// Searched in order: mp.toml, .mp.toml, .config/mp.toml
///
/// Every section is optional; a repository without a config file gets the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MpConfig {
  #[serde(default)]
  pub paths: PathsConfig,
  #[serde(default)]
  pub git: GitConfig,
  #[serde(default)]
  pub package: PackageConfig,
}

/// Where integrations live, relative to the repository root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
  /// Non-built integration sources (default: "integrations")
  #[serde(default = "default_source")]
  pub source: PathBuf,

  /// Built integrations, the packager's input (default: "built")
  #[serde(default = "default_built")]
  pub built: PathBuf,
}

fn default_source() -> PathBuf {
  PathBuf::from("integrations")
}

fn default_built() -> PathBuf {
  PathBuf::from("built")
}

impl Default for PathsConfig {
  fn default() -> Self {
    Self {
      source: default_source(),
      built: default_built(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
  /// Reference the version bump check compares against (default: "main")
  #[serde(default = "default_base_ref")]
  pub base_ref: String,

  /// Remote used when a commit has to be fetched explicitly (default: "origin")
  #[serde(default = "default_remote")]
  pub remote: String,
}

fn default_base_ref() -> String {
  "main".to_string()
}

fn default_remote() -> String {
  "origin".to_string()
}

impl Default for GitConfig {
  fn default() -> Self {
    Self {
      base_ref: default_base_ref(),
      remote: default_remote(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Refuse to package an integration whose release notes are empty
  #[serde(default)]
  pub require_release_notes: bool,
}

impl MpConfig {
  /// Find config file in search order: mp.toml, .mp.toml, .config/mp.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("mp.toml"),
      path.join(".mp.toml"),
      path.join(".config").join("mp.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from mp.toml, falling back to defaults when none exists
  pub fn load(path: &Path) -> MpResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(root = %path.display(), "no mp.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::from_toml_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    tracing::debug!(config = %config_path.display(), "loaded configuration");
    Ok(config)
  }

  pub fn from_toml_str(content: &str) -> MpResult<Self> {
    Ok(toml_edit::de::from_str(content)?)
  }

  /// Reject values that would make every command fail later in a confusing way
  pub fn validate(&self) -> MpResult<()> {
    let empty = |field: &str| {
      MpError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        reason: "must not be empty".to_string(),
      })
    };

    if self.paths.source.as_os_str().is_empty() {
      return Err(empty("paths.source"));
    }
    if self.paths.built.as_os_str().is_empty() {
      return Err(empty("paths.built"));
    }
    if self.git.base_ref.trim().is_empty() {
      return Err(empty("git.base_ref"));
    }
    if self.git.remote.trim().is_empty() {
      return Err(empty("git.remote"));
    }
    if self.paths.source == self.paths.built {
      return Err(MpError::Config(ConfigError::InvalidValue {
        field: "paths.built".to_string(),
        reason: "must differ from paths.source".to_string(),
      }));
    }
    Ok(())
  }
}
