//! Action and integration parameters
//!
//! A parameter can only be constructed in a valid state. The structural rules
//! depend on the parameter type:
//!
//! 1. Enumerated-choice types (`ddl`, `multi_choice`, `multi_values`) must carry
//!    `optional_values`, possibly empty.
//! 2. Every other type must not carry `optional_values`.
//! 3. A non-empty default on an enumerated-choice type must be one of the options,
//!    compared exactly as strings; a number or boolean is never an option. Other
//!    types accept any default.

use super::Buildable;
use crate::core::error::{MpError, MpResult, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MISSING_OPTIONS: &str = "multiple options parameters must have optional values";
pub const UNEXPECTED_OPTIONS: &str = "non-multiple options parameters must not have optional values";
pub const DEFAULT_NOT_AN_OPTION: &str = "the default value of a multiple options parameter must be one of the options";

/// Closed set of parameter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
  String,
  Boolean,
  User,
  Email,
  Content,
  Password,
  EntityType,
  MultiValues,
  Ddl,
  Code,
  MultiChoice,
  Integer,
}

impl ParameterType {
  pub const ALL: [ParameterType; 12] = [
    ParameterType::String,
    ParameterType::Boolean,
    ParameterType::User,
    ParameterType::Email,
    ParameterType::Content,
    ParameterType::Password,
    ParameterType::EntityType,
    ParameterType::MultiValues,
    ParameterType::Ddl,
    ParameterType::Code,
    ParameterType::MultiChoice,
    ParameterType::Integer,
  ];

  /// Numeric type code used in built artifacts
  pub fn code(self) -> u32 {
    match self {
      ParameterType::String => 0,
      ParameterType::Boolean => 1,
      ParameterType::User => 3,
      ParameterType::Email => 10,
      ParameterType::Content => 11,
      ParameterType::Password => 12,
      ParameterType::EntityType => 13,
      ParameterType::MultiValues => 14,
      ParameterType::Ddl => 15,
      ParameterType::Code => 16,
      ParameterType::MultiChoice => 21,
      ParameterType::Integer => 22,
    }
  }

  pub fn from_code(code: u32) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.code() == code)
  }

  /// Whether values must come from a declared option list
  pub fn is_enumerated(self) -> bool {
    matches!(
      self,
      ParameterType::Ddl | ParameterType::MultiChoice | ParameterType::MultiValues
    )
  }
}

/// A validated parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ActionParameter {
  name: String,
  description: String,
  is_mandatory: bool,
  parameter_type: ParameterType,
  optional_values: Option<Vec<String>>,
  default_value: Option<Value>,
}

/// Built shape (`.actiondef` / `.def` JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuiltActionParameter {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub is_mandatory: bool,
  #[serde(rename = "Type")]
  pub parameter_type: u32,
  #[serde(default)]
  pub optional_values: Option<Vec<String>>,
  #[serde(default)]
  pub default_value: Option<Value>,
}

/// Non-built shape (YAML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonBuiltActionParameter {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub is_mandatory: bool,
  #[serde(rename = "type")]
  pub parameter_type: ParameterType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optional_values: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_value: Option<Value>,
}

impl ActionParameter {
  /// Construct a parameter, enforcing the type-dependent invariants
  pub fn new(
    name: impl Into<String>,
    description: impl Into<String>,
    is_mandatory: bool,
    parameter_type: ParameterType,
    optional_values: Option<Vec<String>>,
    default_value: Option<Value>,
  ) -> Result<Self, ValidationError> {
    let name = name.into();
    let violation = |message: &str| ValidationError::Parameter {
      parameter: name.clone(),
      message: message.to_string(),
    };

    match (&optional_values, parameter_type.is_enumerated()) {
      (None, true) => return Err(violation(MISSING_OPTIONS)),
      (Some(_), false) => return Err(violation(UNEXPECTED_OPTIONS)),
      _ => {}
    }

    if let (Some(options), Some(default)) = (&optional_values, default_value.as_ref().filter(|v| !is_empty_default(v)))
      && default
        .as_str()
        .is_none_or(|text| !options.iter().any(|option| option == text))
    {
      return Err(violation(DEFAULT_NOT_AN_OPTION));
    }

    Ok(Self {
      name,
      description: description.into(),
      is_mandatory,
      parameter_type,
      optional_values,
      default_value,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

/// Absent and empty defaults are never checked against the options
fn is_empty_default(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.is_empty(),
    _ => false,
  }
}

impl Buildable for ActionParameter {
  type Built = BuiltActionParameter;
  type NonBuilt = NonBuiltActionParameter;

  const KIND: &'static str = "parameter";

  fn try_from_built(built: Self::Built) -> MpResult<Self> {
    let parameter_type = ParameterType::from_code(built.parameter_type).ok_or_else(|| {
      MpError::message(format!(
        "unknown parameter type code {} for '{}'",
        built.parameter_type, built.name
      ))
    })?;
    Ok(Self::new(
      built.name,
      built.description,
      built.is_mandatory,
      parameter_type,
      built.optional_values,
      built.default_value,
    )?)
  }

  fn try_from_non_built(non_built: Self::NonBuilt) -> MpResult<Self> {
    Ok(Self::new(
      non_built.name,
      non_built.description,
      non_built.is_mandatory,
      non_built.parameter_type,
      non_built.optional_values,
      non_built.default_value,
    )?)
  }

  fn to_built(&self) -> Self::Built {
    BuiltActionParameter {
      name: self.name.clone(),
      description: self.description.clone(),
      is_mandatory: self.is_mandatory,
      parameter_type: self.parameter_type.code(),
      optional_values: self.optional_values.clone(),
      default_value: self.default_value.clone(),
    }
  }

  fn to_non_built(&self) -> Self::NonBuilt {
    NonBuiltActionParameter {
      name: self.name.clone(),
      description: self.description.clone(),
      is_mandatory: self.is_mandatory,
      parameter_type: self.parameter_type,
      optional_values: self.optional_values.clone(),
      default_value: self.default_value.clone(),
    }
  }
}
