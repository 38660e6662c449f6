//! Integration version numbers
//!
//! Integrations carry a float-like `major.minor` version where only the major part
//! moves in normal releases (`11.0` -> `12.0`). The value is compared and subtracted,
//! never mutated.

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A decimal integration version such as `12.0`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "RawVersion", into = "f64")]
pub struct IntegrationVersion(f64);

impl IntegrationVersion {
  /// Every new integration starts here
  pub const INITIAL: IntegrationVersion = IntegrationVersion(1.0);

  /// Wrap a raw value, rejecting NaN, infinities and negatives
  pub fn new(value: f64) -> Option<Self> {
    (value.is_finite() && value >= 0.0).then_some(Self(value))
  }

  pub fn value(self) -> f64 {
    self.0
  }

  /// Distance from an older version (`new - old`)
  pub fn delta_from(self, older: IntegrationVersion) -> f64 {
    self.0 - older.0
  }

  /// Version with dots replaced by dashes, as used in archive names (`12.0` -> `12-0`)
  pub fn dashed(self) -> String {
    self.to_string().replace('.', "-")
  }
}

impl fmt::Display for IntegrationVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.0.fract() == 0.0 {
      write!(f, "{:.1}", self.0)
    } else {
      write!(f, "{}", self.0)
    }
  }
}

impl FromStr for IntegrationVersion {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || ConfigError::InvalidVersion { value: s.to_string() };
    let value: f64 = s.trim().parse().map_err(|_| invalid())?;
    Self::new(value).ok_or_else(invalid)
  }
}

impl From<IntegrationVersion> for f64 {
  fn from(version: IntegrationVersion) -> Self {
    version.0
  }
}

/// Versions show up as numbers in JSON/YAML and as strings in pyproject.toml
#[derive(Deserialize)]
#[serde(untagged)]
enum RawVersion {
  Number(f64),
  Text(String),
}

impl TryFrom<RawVersion> for IntegrationVersion {
  type Error = String;

  fn try_from(raw: RawVersion) -> Result<Self, Self::Error> {
    match raw {
      RawVersion::Number(n) => Self::new(n).ok_or_else(|| format!("invalid version {}", n)),
      RawVersion::Text(s) => s.parse().map_err(|e: ConfigError| e.to_string()),
    }
  }
}
