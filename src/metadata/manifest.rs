//! Integration project manifest (`pyproject.toml`)

use super::version::IntegrationVersion;
use crate::core::error::{Form, MpError, MpResult, ResultExt, ValidationError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml_edit::{Array, DocumentMut, Item, Table, value};

pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Name, version and dependencies of one integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationManifest {
  name: String,
  version: IntegrationVersion,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  description: Option<String>,
  #[serde(default)]
  dependencies: Vec<String>,
}

#[derive(Deserialize)]
struct PyProject {
  project: IntegrationManifest,
}

impl IntegrationManifest {
  pub fn new(name: impl Into<String>, version: IntegrationVersion) -> Self {
    Self {
      name: name.into(),
      version,
      description: None,
      dependencies: Vec::new(),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
    self.dependencies = dependencies;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn version(&self) -> IntegrationVersion {
    self.version
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn dependencies(&self) -> &[String] {
    &self.dependencies
  }

  /// Parse the `[project]` table of a `pyproject.toml` document
  pub fn from_pyproject_str(text: &str) -> MpResult<Self> {
    let pyproject: PyProject = toml_edit::de::from_str(text).map_err(|e| {
      MpError::Validation(ValidationError::Load {
        form: Form::NonBuilt,
        kind: "manifest",
        reason: e.to_string(),
        payload: super::trim_payload(text),
        path: None,
      })
    })?;
    Ok(pyproject.project)
  }

  pub fn load(path: &Path) -> MpResult<Self> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::from_pyproject_str(&text).map_err(|e| match e {
      MpError::Validation(ValidationError::Load {
        form,
        kind,
        reason,
        payload,
        ..
      }) => MpError::Validation(ValidationError::Load {
        form,
        kind,
        reason,
        payload,
        path: Some(path.to_path_buf()),
      }),
      other => other,
    })
  }

  /// Render a fresh `pyproject.toml` for this manifest
  pub fn to_pyproject_string(&self) -> String {
    let mut project = Table::new();
    project["name"] = value(self.name.as_str());
    project["version"] = value(self.version.to_string());
    if let Some(description) = &self.description {
      project["description"] = value(description.as_str());
    }
    let mut dependencies = Array::new();
    for dependency in &self.dependencies {
      dependencies.push(dependency.as_str());
    }
    project["dependencies"] = value(dependencies);

    let mut doc = DocumentMut::new();
    doc["project"] = Item::Table(project);
    doc.to_string()
  }
}
