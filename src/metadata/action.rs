//! Action definitions
//!
//! Non-built: `actions/<file>.yaml` next to `actions/<file>.py`.
//! Built: `ActionsDefinitions/<file>.actiondef` next to `ActionsScripts/<file>.py`.

use super::parameter::{ActionParameter, BuiltActionParameter, NonBuiltActionParameter};
use super::{Buildable, ScriptMetadata};
use crate::core::error::{MpError, MpResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_SCRIPT_RESULT_NAME: &str = "is_success";
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 600;

/// A validated action definition
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMetadata {
  file_name: String,
  name: String,
  description: String,
  integration_identifier: String,
  script_result_name: String,
  is_async: bool,
  timeout_seconds: u32,
  parameters: Vec<ActionParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuiltAction {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub integration_identifier: String,
  #[serde(default = "default_script_result_name")]
  pub script_result_name: String,
  #[serde(default)]
  pub is_async: bool,
  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u32,
  #[serde(default)]
  pub parameters: Vec<BuiltActionParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonBuiltAction {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub integration_identifier: String,
  #[serde(default = "default_script_result_name")]
  pub script_result_name: String,
  #[serde(default)]
  pub is_async: bool,
  #[serde(default = "default_timeout_seconds")]
  pub timeout_seconds: u32,
  #[serde(default)]
  pub parameters: Vec<NonBuiltActionParameter>,
}

fn default_script_result_name() -> String {
  DEFAULT_SCRIPT_RESULT_NAME.to_string()
}

fn default_timeout_seconds() -> u32 {
  DEFAULT_TIMEOUT_SECONDS
}

impl ActionMetadata {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn integration_identifier(&self) -> &str {
    &self.integration_identifier
  }

  /// Script file paired with this definition
  pub fn script_file(&self) -> String {
    format!("{}.py", self.file_name)
  }

  #[allow(clippy::too_many_arguments)]
  fn assemble(
    file_name: &str,
    name: String,
    description: String,
    integration_identifier: String,
    script_result_name: String,
    is_async: bool,
    timeout_seconds: u32,
    parameters: Vec<ActionParameter>,
  ) -> MpResult<Self> {
    if file_name.trim().is_empty() {
      return Err(MpError::message(format!("action '{}' has an empty file name", name)));
    }
    if name.trim().is_empty() {
      return Err(MpError::message("action name must not be empty"));
    }
    if let Some(duplicate) = first_duplicate(&parameters) {
      return Err(MpError::message(format!(
        "action '{}' declares parameter '{}' more than once",
        name, duplicate
      )));
    }
    Ok(Self {
      file_name: file_name.to_string(),
      name,
      description,
      integration_identifier,
      script_result_name,
      is_async,
      timeout_seconds,
      parameters,
    })
  }
}

fn first_duplicate(parameters: &[ActionParameter]) -> Option<String> {
  let mut seen = HashSet::new();
  parameters
    .iter()
    .find(|p| !seen.insert(p.name()))
    .map(|p| p.name().to_string())
}

impl ScriptMetadata for ActionMetadata {
  type Built = BuiltAction;
  type NonBuilt = NonBuiltAction;

  const KIND: &'static str = "action";

  fn try_from_built(file_name: &str, built: Self::Built) -> MpResult<Self> {
    let parameters = built
      .parameters
      .into_iter()
      .map(ActionParameter::from_built)
      .collect::<MpResult<Vec<_>>>()?;
    Self::assemble(
      file_name,
      built.name,
      built.description,
      built.integration_identifier,
      built.script_result_name,
      built.is_async,
      built.timeout_seconds,
      parameters,
    )
  }

  fn try_from_non_built(file_name: &str, non_built: Self::NonBuilt) -> MpResult<Self> {
    let parameters = non_built
      .parameters
      .into_iter()
      .map(ActionParameter::from_non_built)
      .collect::<MpResult<Vec<_>>>()?;
    Self::assemble(
      file_name,
      non_built.name,
      non_built.description,
      non_built.integration_identifier,
      non_built.script_result_name,
      non_built.is_async,
      non_built.timeout_seconds,
      parameters,
    )
  }

  fn to_built(&self) -> Self::Built {
    BuiltAction {
      name: self.name.clone(),
      description: self.description.clone(),
      integration_identifier: self.integration_identifier.clone(),
      script_result_name: self.script_result_name.clone(),
      is_async: self.is_async,
      timeout_seconds: self.timeout_seconds,
      parameters: self.parameters.iter().map(Buildable::to_built).collect(),
    }
  }

  fn to_non_built(&self) -> Self::NonBuilt {
    NonBuiltAction {
      name: self.name.clone(),
      description: self.description.clone(),
      integration_identifier: self.integration_identifier.clone(),
      script_result_name: self.script_result_name.clone(),
      is_async: self.is_async,
      timeout_seconds: self.timeout_seconds,
      parameters: self.parameters.iter().map(Buildable::to_non_built).collect(),
    }
  }

  fn file_name(&self) -> &str {
    &self.file_name
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  const PING_YAML: &str = r#"
name: Ping
description: Test connectivity
integration_identifier: VirusTotal
parameters:
  - name: Verbose
    type: boolean
    default_value: "false"
  - name: Region
    type: ddl
    optional_values: [EU, US]
    default_value: EU
"#;

  #[test]
  fn test_file_name_comes_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ping.yaml");
    fs::write(&path, PING_YAML).unwrap();

    let action = ActionMetadata::from_non_built_path(&path).unwrap();
    assert_eq!(action.file_name(), "ping");
    assert_eq!(action.script_file(), "ping.py");
    assert_eq!(action.to_built().parameters.len(), 2);
    assert_eq!(action.to_built().timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
  }

  #[test]
  fn test_round_trips_with_file_name() {
    let non_built: NonBuiltAction = serde_yaml::from_str(PING_YAML).unwrap();
    let action = ActionMetadata::from_non_built("ping", non_built).unwrap();
    assert_eq!(ActionMetadata::from_built("ping", action.to_built()).unwrap(), action);
    assert_eq!(ActionMetadata::from_non_built("ping", action.to_non_built()).unwrap(), action);
  }

  #[test]
  fn test_invalid_parameter_fails_the_action() {
    let yaml = PING_YAML.replace("default_value: EU", "default_value: APAC");
    let non_built: NonBuiltAction = serde_yaml::from_str(&yaml).unwrap();
    let err = ActionMetadata::from_non_built("ping", non_built).unwrap_err().to_string();
    assert!(err.contains("failed to load non-built parameter"), "{}", err);
    assert!(err.contains("must be one of the options"), "{}", err);
  }

  #[test]
  fn test_duplicate_parameter_names_rejected() {
    let yaml = PING_YAML.replace("name: Region", "name: Verbose");
    let non_built: NonBuiltAction = serde_yaml::from_str(&yaml).unwrap();
    let err = ActionMetadata::from_non_built("ping", non_built).unwrap_err().to_string();
    assert!(err.starts_with("failed to load non-built action"), "{}", err);
    assert!(err.contains("more than once"), "{}", err);
  }
}
