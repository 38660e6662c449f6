//! Release notes
//!
//! A release-notes document is an ordered, append-only list of entries. Several
//! entries may share one version when a release touches several items.

use super::version::IntegrationVersion;
use super::{Buildable, SequentialMetadata};
use crate::core::error::{MpError, MpResult};
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a release note is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
  Integration,
  Action,
  Connector,
  Job,
  Widget,
}

impl fmt::Display for ItemType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ItemType::Integration => write!(f, "Integration"),
      ItemType::Action => write!(f, "Action"),
      ItemType::Connector => write!(f, "Connector"),
      ItemType::Job => write!(f, "Job"),
      ItemType::Widget => write!(f, "Widget"),
    }
  }
}

/// One recorded change
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseNote {
  pub version: IntegrationVersion,
  pub description: String,
  pub item_name: String,
  pub item_type: ItemType,
  pub new: bool,
  pub removed: bool,
  pub regressive: bool,
  pub deprecated: bool,
  pub ticket_number: Option<String>,
  pub publish_time: Option<NaiveDate>,
}

/// Built shape (one element of `RN.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuiltReleaseNote {
  pub change_description: String,
  pub introduced_in_integration_version: IntegrationVersion,
  pub item_name: String,
  pub item_type: ItemType,
  #[serde(default)]
  pub new: bool,
  #[serde(default)]
  pub removed: bool,
  #[serde(default)]
  pub regressive: bool,
  #[serde(default)]
  pub deprecated: bool,
  #[serde(default)]
  pub ticket_number: Option<String>,
  /// Unix milliseconds at UTC midnight
  #[serde(default)]
  pub publish_time: Option<i64>,
}

/// Non-built shape (one element of `release_notes.yaml`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonBuiltReleaseNote {
  pub description: String,
  pub integration_version: IntegrationVersion,
  pub item_name: String,
  pub item_type: ItemType,
  #[serde(default)]
  pub new: bool,
  #[serde(default)]
  pub removed: bool,
  #[serde(default)]
  pub regressive: bool,
  #[serde(default)]
  pub deprecated: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ticket_number: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub publish_time: Option<NaiveDate>,
}

fn date_to_millis(date: NaiveDate) -> i64 {
  date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

fn millis_to_date(millis: i64) -> MpResult<NaiveDate> {
  DateTime::from_timestamp_millis(millis)
    .map(|dt| dt.date_naive())
    .ok_or_else(|| MpError::message(format!("publish time {} is out of range", millis)))
}

impl Buildable for ReleaseNote {
  type Built = BuiltReleaseNote;
  type NonBuilt = NonBuiltReleaseNote;

  const KIND: &'static str = "release note";

  fn try_from_built(built: Self::Built) -> MpResult<Self> {
    let publish_time = built.publish_time.map(millis_to_date).transpose()?;
    Ok(Self {
      version: built.introduced_in_integration_version,
      description: built.change_description,
      item_name: built.item_name,
      item_type: built.item_type,
      new: built.new,
      removed: built.removed,
      regressive: built.regressive,
      deprecated: built.deprecated,
      ticket_number: built.ticket_number,
      publish_time,
    })
  }

  fn try_from_non_built(non_built: Self::NonBuilt) -> MpResult<Self> {
    Ok(Self {
      version: non_built.integration_version,
      description: non_built.description,
      item_name: non_built.item_name,
      item_type: non_built.item_type,
      new: non_built.new,
      removed: non_built.removed,
      regressive: non_built.regressive,
      deprecated: non_built.deprecated,
      ticket_number: non_built.ticket_number,
      publish_time: non_built.publish_time,
    })
  }

  fn to_built(&self) -> Self::Built {
    BuiltReleaseNote {
      change_description: self.description.clone(),
      introduced_in_integration_version: self.version,
      item_name: self.item_name.clone(),
      item_type: self.item_type,
      new: self.new,
      removed: self.removed,
      regressive: self.regressive,
      deprecated: self.deprecated,
      ticket_number: self.ticket_number.clone(),
      publish_time: self.publish_time.map(date_to_millis),
    }
  }

  fn to_non_built(&self) -> Self::NonBuilt {
    NonBuiltReleaseNote {
      description: self.description.clone(),
      integration_version: self.version,
      item_name: self.item_name.clone(),
      item_type: self.item_type,
      new: self.new,
      removed: self.removed,
      regressive: self.regressive,
      deprecated: self.deprecated,
      ticket_number: self.ticket_number.clone(),
      publish_time: self.publish_time,
    }
  }
}

impl SequentialMetadata for ReleaseNote {}
