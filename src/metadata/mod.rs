//! Built / non-built transformation contract
//!
//! Every metadata entity in an integration exists in two serialized forms:
//!
//! - **non-built**: the human-authored source (YAML documents, `pyproject.toml`)
//! - **built**: the flattened, runtime-consumable artifact (JSON)
//!
//! The traits here give all entities one way in and one way out. Construction is
//! fallible and validates every invariant up front; serialization back is total.
//! A failed construction always surfaces as [`ValidationError::Load`] carrying a
//! trimmed rendering of the payload, never as a raw parser error.
//!
//! Three contract shapes exist:
//!
//! - [`Buildable`]: plain entities (parameters, release notes, integrations)
//! - [`ScriptMetadata`]: entities whose file name carries identity (actions)
//! - [`SequentialMetadata`]: entities stored as a list in one file (release notes)

pub mod action;
pub mod integration;
pub mod manifest;
pub mod parameter;
pub mod release_note;
pub mod version;

use crate::core::error::{Form, MpError, MpResult, ResultExt, ValidationError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Longest string kept verbatim in an error payload
const MAX_PAYLOAD_STRING: usize = 64;
/// Arrays of plain numbers longer than this are treated as binary noise
const MAX_BYTE_ITEMS: usize = 16;
/// Longest raw document excerpt kept when the text itself fails to parse
const MAX_RAW_EXCERPT: usize = 256;

/// Entity convertible between a built shape and a non-built shape
pub trait Buildable: Sized {
  type Built: Serialize + DeserializeOwned;
  type NonBuilt: Serialize + DeserializeOwned;

  /// Human-readable entity kind used in error messages
  const KIND: &'static str;

  /// Build and validate the entity from its built shape
  fn try_from_built(built: Self::Built) -> MpResult<Self>;

  /// Build and validate the entity from its non-built shape
  fn try_from_non_built(non_built: Self::NonBuilt) -> MpResult<Self>;

  fn to_built(&self) -> Self::Built;

  fn to_non_built(&self) -> Self::NonBuilt;

  /// Construct from the built shape, wrapping any failure with a trimmed payload
  fn from_built(built: Self::Built) -> MpResult<Self> {
    let payload = trim_payload(&built);
    Self::try_from_built(built).map_err(|e| load_error(Form::Built, Self::KIND, e, payload))
  }

  /// Construct from the non-built shape, wrapping any failure with a trimmed payload
  fn from_non_built(non_built: Self::NonBuilt) -> MpResult<Self> {
    let payload = trim_payload(&non_built);
    Self::try_from_non_built(non_built).map_err(|e| load_error(Form::NonBuilt, Self::KIND, e, payload))
  }

  /// Parse a built JSON document
  fn from_built_str(text: &str) -> MpResult<Self> {
    Self::from_built(parse_built_text(text, Self::KIND)?)
  }

  /// Parse a non-built YAML document
  fn from_non_built_str(text: &str) -> MpResult<Self> {
    Self::from_non_built(parse_non_built_text(text, Self::KIND)?)
  }

  fn from_built_path(path: &Path) -> MpResult<Self> {
    let text = read_document(path)?;
    Self::from_built_str(&text).map_err(|e| at_path(e, path))
  }

  fn from_non_built_path(path: &Path) -> MpResult<Self> {
    let text = read_document(path)?;
    Self::from_non_built_str(&text).map_err(|e| at_path(e, path))
  }
}

/// Entity whose file name carries identity the payload does not
///
/// An action's definition does not name its own script; the file stem pairs
/// `ping.yaml` with `ping.py` (non-built) and `Ping.actiondef` with `Ping.py`
/// (built), so the stem is threaded through both constructors.
pub trait ScriptMetadata: Sized {
  type Built: Serialize + DeserializeOwned;
  type NonBuilt: Serialize + DeserializeOwned;

  const KIND: &'static str;

  fn try_from_built(file_name: &str, built: Self::Built) -> MpResult<Self>;

  fn try_from_non_built(file_name: &str, non_built: Self::NonBuilt) -> MpResult<Self>;

  fn to_built(&self) -> Self::Built;

  fn to_non_built(&self) -> Self::NonBuilt;

  /// File stem shared by the definition and its script
  fn file_name(&self) -> &str;

  fn from_built(file_name: &str, built: Self::Built) -> MpResult<Self> {
    let payload = trim_payload(&built);
    Self::try_from_built(file_name, built).map_err(|e| load_error(Form::Built, Self::KIND, e, payload))
  }

  fn from_non_built(file_name: &str, non_built: Self::NonBuilt) -> MpResult<Self> {
    let payload = trim_payload(&non_built);
    Self::try_from_non_built(file_name, non_built).map_err(|e| load_error(Form::NonBuilt, Self::KIND, e, payload))
  }

  fn from_built_path(path: &Path) -> MpResult<Self> {
    let file_name = file_stem(path)?;
    let text = read_document(path)?;
    parse_built_text(&text, Self::KIND)
      .and_then(|built| Self::from_built(&file_name, built))
      .map_err(|e| at_path(e, path))
  }

  fn from_non_built_path(path: &Path) -> MpResult<Self> {
    let file_name = file_stem(path)?;
    let text = read_document(path)?;
    parse_non_built_text(&text, Self::KIND)
      .and_then(|non_built| Self::from_non_built(&file_name, non_built))
      .map_err(|e| at_path(e, path))
  }
}

/// Entity stored as a list in a single file
///
/// Built files are JSON arrays, non-built files are YAML lists. Every element is
/// constructed on its own; the first malformed element fails the whole file.
pub trait SequentialMetadata: Buildable {
  fn from_built_list(items: Vec<Self::Built>) -> MpResult<Vec<Self>> {
    items.into_iter().map(Self::from_built).collect()
  }

  fn from_non_built_list(items: Vec<Self::NonBuilt>) -> MpResult<Vec<Self>> {
    items.into_iter().map(Self::from_non_built).collect()
  }

  fn from_built_file(path: &Path) -> MpResult<Vec<Self>> {
    let text = read_document(path)?;
    parse_built_text::<Vec<Self::Built>>(&text, Self::KIND)
      .and_then(Self::from_built_list)
      .map_err(|e| at_path(e, path))
  }

  /// Parse a non-built YAML list; an empty document is an empty list
  fn from_non_built_list_str(text: &str) -> MpResult<Vec<Self>> {
    parse_non_built_list_text::<Self::NonBuilt>(text, Self::KIND).and_then(Self::from_non_built_list)
  }

  fn from_non_built_file(path: &Path) -> MpResult<Vec<Self>> {
    let text = read_document(path)?;
    Self::from_non_built_list_str(&text).map_err(|e| at_path(e, path))
  }

  fn to_built_list(items: &[Self]) -> Vec<Self::Built> {
    items.iter().map(Self::to_built).collect()
  }

  fn to_non_built_list(items: &[Self]) -> Vec<Self::NonBuilt> {
    items.iter().map(Self::to_non_built).collect()
  }
}

/// Render a payload as compact JSON with long strings and byte blobs cut down
pub fn trim_payload<T: Serialize + ?Sized>(payload: &T) -> String {
  match serde_json::to_value(payload) {
    Ok(value) => trim_value(value).to_string(),
    Err(_) => "<unrenderable payload>".to_string(),
  }
}

fn trim_value(value: Value) -> Value {
  match value {
    Value::String(s) => Value::String(truncate(&s, MAX_PAYLOAD_STRING)),
    Value::Array(items) if items.len() > MAX_BYTE_ITEMS && items.iter().all(Value::is_u64) => {
      Value::String(format!("<{} bytes>", items.len()))
    }
    Value::Array(items) => Value::Array(items.into_iter().map(trim_value).collect()),
    Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, trim_value(v))).collect()),
    other => other,
  }
}

fn truncate(s: &str, max_chars: usize) -> String {
  let total = s.chars().count();
  if total <= max_chars {
    return s.to_string();
  }
  let head: String = s.chars().take(max_chars).collect();
  format!("{}...[{} more chars]", head, total - max_chars)
}

fn load_error(form: Form, kind: &'static str, err: MpError, payload: String) -> MpError {
  match err {
    // Nested entities already produced a precise load error
    MpError::Validation(inner @ ValidationError::Load { .. }) => MpError::Validation(inner),
    other => MpError::Validation(ValidationError::Load {
      form,
      kind,
      reason: other.to_string(),
      payload,
      path: None,
    }),
  }
}

/// Attach the offending file to a load error that does not name one yet
fn at_path(err: MpError, path: &Path) -> MpError {
  match err {
    MpError::Validation(ValidationError::Load {
      form,
      kind,
      reason,
      payload,
      path: None,
    }) => MpError::Validation(ValidationError::Load {
      form,
      kind,
      reason,
      payload,
      path: Some(path.to_path_buf()),
    }),
    other => other,
  }
}

fn parse_built_text<T: DeserializeOwned>(text: &str, kind: &'static str) -> MpResult<T> {
  serde_json::from_str(text).map_err(|e| {
    MpError::Validation(ValidationError::Load {
      form: Form::Built,
      kind,
      reason: e.to_string(),
      payload: truncate(text.trim(), MAX_RAW_EXCERPT),
      path: None,
    })
  })
}

fn parse_non_built_text<T: DeserializeOwned>(text: &str, kind: &'static str) -> MpResult<T> {
  serde_yaml::from_str(text).map_err(|e| {
    MpError::Validation(ValidationError::Load {
      form: Form::NonBuilt,
      kind,
      reason: e.to_string(),
      payload: truncate(text.trim(), MAX_RAW_EXCERPT),
      path: None,
    })
  })
}

/// An empty YAML document is an empty list, not a parse failure
fn parse_non_built_list_text<T: DeserializeOwned>(text: &str, kind: &'static str) -> MpResult<Vec<T>> {
  if text.trim().is_empty() {
    return Ok(Vec::new());
  }
  parse_non_built_text::<Option<Vec<T>>>(text, kind).map(Option::unwrap_or_default)
}

/// Read and parse a non-built YAML document that is not itself an entity
pub(crate) fn load_non_built_document<T: DeserializeOwned>(path: &Path, kind: &'static str) -> MpResult<T> {
  let text = read_document(path)?;
  parse_non_built_text(&text, kind).map_err(|e| at_path(e, path))
}

fn read_document(path: &Path) -> MpResult<String> {
  fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn file_stem(path: &Path) -> MpResult<String> {
  path
    .file_stem()
    .and_then(|s| s.to_str())
    .map(str::to_string)
    .ok_or_else(|| MpError::message(format!("Cannot derive a script name from {}", path.display())))
}

/// Write a built artifact as pretty JSON
pub fn write_built<T: Serialize + ?Sized>(path: &Path, value: &T) -> MpResult<()> {
  let mut text = serde_json::to_string_pretty(value)?;
  text.push('\n');
  write_document(path, &text)
}

/// Write a non-built document as YAML
pub fn write_non_built<T: Serialize + ?Sized>(path: &Path, value: &T) -> MpResult<()> {
  let text = serde_yaml::to_string(value)?;
  write_document(path, &text)
}

fn write_document(path: &Path, text: &str) -> MpResult<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
  }
  fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}
