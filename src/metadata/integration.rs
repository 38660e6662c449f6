//! Integration definition and the per-directory metadata aggregate
//!
//! Non-built layout:
//!
//! ```text
//! <integration>/
//!   pyproject.toml
//!   definition.yaml
//!   release_notes.yaml
//!   actions/<file>.yaml
//!   actions/<file>.py
//! ```
//!
//! Built layout:
//!
//! ```text
//! <identifier>/
//!   Integration-<identifier>.def
//!   RN.json
//!   ActionsDefinitions/<file>.actiondef
//!   ActionsScripts/<file>.py
//! ```

use super::action::ActionMetadata;
use super::manifest::{IntegrationManifest, MANIFEST_FILE};
use super::parameter::{ActionParameter, BuiltActionParameter, NonBuiltActionParameter};
use super::release_note::ReleaseNote;
use super::version::IntegrationVersion;
use super::{Buildable, ScriptMetadata, SequentialMetadata, load_non_built_document, write_built, write_non_built};
use crate::core::error::{MpError, MpResult, ResultExt};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFINITION_FILE: &str = "definition.yaml";
pub const RELEASE_NOTES_FILE: &str = "release_notes.yaml";
pub const ACTIONS_DIR: &str = "actions";
pub const BUILT_RELEASE_NOTES_FILE: &str = "RN.json";
pub const BUILT_ACTIONS_DIR: &str = "ActionsDefinitions";
pub const BUILT_SCRIPTS_DIR: &str = "ActionsScripts";

/// `Integration-<identifier>.def`
pub fn built_definition_file_name(identifier: &str) -> String {
  format!("Integration-{}.def", identifier)
}

/// A validated integration definition
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
  identifier: String,
  display_name: String,
  description: String,
  /// `[project].description` of the manifest, which the built form does not carry
  manifest_description: Option<String>,
  version: IntegrationVersion,
  is_custom: bool,
  categories: Vec<String>,
  dependencies: Vec<String>,
  parameters: Vec<ActionParameter>,
}

/// Built shape (`Integration-<identifier>.def`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuiltIntegration {
  pub identifier: String,
  pub display_name: String,
  #[serde(default)]
  pub description: String,
  pub version: IntegrationVersion,
  #[serde(default)]
  pub is_custom: bool,
  #[serde(default)]
  pub categories: Vec<String>,
  #[serde(default)]
  pub dependencies: Vec<String>,
  #[serde(default)]
  pub parameters: Vec<BuiltActionParameter>,
}

/// `definition.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonBuiltDefinition {
  pub identifier: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub categories: Vec<String>,
  #[serde(default)]
  pub is_custom: bool,
  #[serde(default)]
  pub parameters: Vec<NonBuiltActionParameter>,
}

/// Non-built shape: the integration is spread over its manifest and its definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonBuiltIntegration {
  pub manifest: IntegrationManifest,
  pub definition: NonBuiltDefinition,
}

impl Integration {
  pub fn identifier(&self) -> &str {
    &self.identifier
  }

  fn check(self) -> MpResult<Self> {
    if self.identifier.trim().is_empty() {
      return Err(MpError::message("integration identifier must not be empty"));
    }
    let mut seen = HashSet::new();
    for parameter in &self.parameters {
      if !seen.insert(parameter.name()) {
        return Err(MpError::message(format!(
          "integration '{}' declares parameter '{}' more than once",
          self.identifier,
          parameter.name()
        )));
      }
    }
    Ok(self)
  }
}

impl Buildable for Integration {
  type Built = BuiltIntegration;
  type NonBuilt = NonBuiltIntegration;

  const KIND: &'static str = "integration";

  fn try_from_built(built: Self::Built) -> MpResult<Self> {
    let parameters = built
      .parameters
      .into_iter()
      .map(ActionParameter::from_built)
      .collect::<MpResult<Vec<_>>>()?;
    // A deconstructed manifest mirrors the definition's description
    let manifest_description = Some(built.description.clone()).filter(|d| !d.trim().is_empty());
    Self {
      identifier: built.identifier,
      display_name: built.display_name,
      description: built.description,
      manifest_description,
      version: built.version,
      is_custom: built.is_custom,
      categories: built.categories,
      dependencies: built.dependencies,
      parameters,
    }
    .check()
  }

  fn try_from_non_built(non_built: Self::NonBuilt) -> MpResult<Self> {
    let NonBuiltIntegration { manifest, definition } = non_built;
    if manifest.name() != definition.identifier {
      return Err(MpError::message(format!(
        "{} names the project '{}' but the definition identifier is '{}'",
        MANIFEST_FILE,
        manifest.name(),
        definition.identifier
      )));
    }
    let parameters = definition
      .parameters
      .into_iter()
      .map(ActionParameter::from_non_built)
      .collect::<MpResult<Vec<_>>>()?;
    Self {
      identifier: definition.identifier,
      display_name: definition.name,
      description: definition.description,
      manifest_description: manifest.description().map(str::to_string),
      version: manifest.version(),
      is_custom: definition.is_custom,
      categories: definition.categories,
      dependencies: manifest.dependencies().to_vec(),
      parameters,
    }
    .check()
  }

  fn to_built(&self) -> Self::Built {
    BuiltIntegration {
      identifier: self.identifier.clone(),
      display_name: self.display_name.clone(),
      description: self.description.clone(),
      version: self.version,
      is_custom: self.is_custom,
      categories: self.categories.clone(),
      dependencies: self.dependencies.clone(),
      parameters: self.parameters.iter().map(Buildable::to_built).collect(),
    }
  }

  fn to_non_built(&self) -> Self::NonBuilt {
    let mut manifest =
      IntegrationManifest::new(self.identifier.clone(), self.version).with_dependencies(self.dependencies.clone());
    if let Some(description) = &self.manifest_description {
      manifest = manifest.with_description(description.clone());
    }
    NonBuiltIntegration {
      manifest,
      definition: NonBuiltDefinition {
        identifier: self.identifier.clone(),
        name: self.display_name.clone(),
        description: self.description.clone(),
        categories: self.categories.clone(),
        is_custom: self.is_custom,
        parameters: self.parameters.iter().map(Buildable::to_non_built).collect(),
      },
    }
  }
}

/// Everything one integration directory holds
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationMetadata {
  pub integration: Integration,
  pub actions: Vec<ActionMetadata>,
  pub release_notes: Vec<ReleaseNote>,
}

impl IntegrationMetadata {
  pub fn identifier(&self) -> &str {
    self.integration.identifier()
  }

  /// Load a non-built integration source directory
  pub fn from_non_built_path(dir: &Path) -> MpResult<Self> {
    let manifest = IntegrationManifest::load(&dir.join(MANIFEST_FILE))?;
    let definition: NonBuiltDefinition = load_non_built_document(&dir.join(DEFINITION_FILE), Integration::KIND)?;
    let integration = Integration::from_non_built(NonBuiltIntegration { manifest, definition })?;

    let actions = utils::files_with_extension(&dir.join(ACTIONS_DIR), "yaml")?
      .iter()
      .map(|path| ActionMetadata::from_non_built_path(path))
      .collect::<MpResult<Vec<_>>>()?;

    let notes_path = dir.join(RELEASE_NOTES_FILE);
    let release_notes = if notes_path.is_file() {
      ReleaseNote::from_non_built_file(&notes_path)?
    } else {
      Vec::new()
    };

    Self::assemble(integration, actions, release_notes)
  }

  /// Load a built integration directory
  pub fn from_built_path(dir: &Path) -> MpResult<Self> {
    let definition_path = find_built_definition(dir)?;
    let integration = Integration::from_built_path(&definition_path)?;

    let actions = utils::files_with_extension(&dir.join(BUILT_ACTIONS_DIR), "actiondef")?
      .iter()
      .map(|path| ActionMetadata::from_built_path(path))
      .collect::<MpResult<Vec<_>>>()?;

    let notes_path = dir.join(BUILT_RELEASE_NOTES_FILE);
    let release_notes = if notes_path.is_file() {
      ReleaseNote::from_built_file(&notes_path)?
    } else {
      Vec::new()
    };

    Self::assemble(integration, actions, release_notes)
  }

  fn assemble(integration: Integration, actions: Vec<ActionMetadata>, release_notes: Vec<ReleaseNote>) -> MpResult<Self> {
    if let Some(stray) = actions
      .iter()
      .find(|a| a.integration_identifier() != integration.identifier())
    {
      return Err(MpError::message(format!(
        "action '{}' belongs to '{}', not to '{}'",
        stray.name(),
        stray.integration_identifier(),
        integration.identifier()
      )));
    }
    Ok(Self {
      integration,
      actions,
      release_notes,
    })
  }

  /// Write the built form into `out_dir`, copying action scripts from `source_dir`
  ///
  /// `out_dir` is replaced: the built form is always derivable from the source.
  pub fn write_built(&self, source_dir: &Path, out_dir: &Path) -> MpResult<()> {
    if out_dir.exists() {
      fs::remove_dir_all(out_dir).with_context(|| format!("Failed to clear {}", out_dir.display()))?;
    }

    write_built(
      &out_dir.join(built_definition_file_name(self.identifier())),
      &self.integration.to_built(),
    )?;
    write_built(
      &out_dir.join(BUILT_RELEASE_NOTES_FILE),
      &ReleaseNote::to_built_list(&self.release_notes),
    )?;

    for action in &self.actions {
      write_built(
        &out_dir
          .join(BUILT_ACTIONS_DIR)
          .join(format!("{}.actiondef", action.file_name())),
        &action.to_built(),
      )?;
      copy_script(
        &source_dir.join(ACTIONS_DIR).join(action.script_file()),
        &out_dir.join(BUILT_SCRIPTS_DIR).join(action.script_file()),
      )?;
    }
    Ok(())
  }

  /// Write the non-built form into `out_dir`, copying action scripts from `built_dir`
  pub fn write_non_built(&self, built_dir: &Path, out_dir: &Path) -> MpResult<()> {
    let non_built = self.integration.to_non_built();

    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
    fs::write(out_dir.join(MANIFEST_FILE), non_built.manifest.to_pyproject_string())
      .with_context(|| format!("Failed to write {}", out_dir.join(MANIFEST_FILE).display()))?;
    write_non_built(&out_dir.join(DEFINITION_FILE), &non_built.definition)?;
    write_non_built(
      &out_dir.join(RELEASE_NOTES_FILE),
      &ReleaseNote::to_non_built_list(&self.release_notes),
    )?;

    for action in &self.actions {
      write_non_built(
        &out_dir.join(ACTIONS_DIR).join(format!("{}.yaml", action.file_name())),
        &action.to_non_built(),
      )?;
      copy_script(
        &built_dir.join(BUILT_SCRIPTS_DIR).join(action.script_file()),
        &out_dir.join(ACTIONS_DIR).join(action.script_file()),
      )?;
    }
    Ok(())
  }
}

fn copy_script(from: &Path, to: &Path) -> MpResult<()> {
  if from.is_file() {
    utils::copy_file(from, to)
  } else {
    tracing::warn!(script = %from.display(), "action script missing, skipping");
    Ok(())
  }
}

/// Locate `Integration-*.def` inside a built integration directory
pub fn find_built_definition(dir: &Path) -> MpResult<PathBuf> {
  utils::files_with_extension(dir, "def")?
    .into_iter()
    .find(|path| {
      path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("Integration-"))
    })
    .ok_or_else(|| MpError::message(format!("No Integration-*.def found in {}", dir.display())))
}
