//! Error types for mp with contextual messages and exit codes
//!
//! Errors fall into two families. Validation errors (malformed payloads, parameter
//! schema violations, version bump policy violations) are fatal to one integration
//! but not to a batch run, so callers can keep going and report everything at once.
//! Environment errors (git, I/O, configuration) abort the current operation.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for mp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Validation failure (schema, version bump, package preconditions)
  Validation = 3,
  /// Packaging succeeded but the working tree could not be fully restored
  RestoreIncomplete = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for mp
#[derive(Debug)]
pub enum MpError {
  /// Configuration and argument errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// Validation errors (non-fatal to a batch run)
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// The archive was written but the working tree was not fully put back
  RestoreIncomplete { failures: Vec<String>, hint: String },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl MpError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    MpError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    MpError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      MpError::Message { message, context, help } => MpError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      // Still an I/O failure, so it keeps the system exit code
      MpError::Io(e) => MpError::Io(io::Error::new(e.kind(), format!("{}: {}", ctx_str, e))),
      _ => self,
    }
  }

  /// Whether this error only invalidates the integration at hand
  pub fn is_non_fatal(&self) -> bool {
    match self {
      MpError::Validation(_) => true,
      MpError::Git(e) => e.is_non_fatal(),
      _ => false,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      MpError::Config(_) => ExitCode::User,
      MpError::Git(_) => ExitCode::System,
      MpError::Validation(_) => ExitCode::Validation,
      MpError::Io(_) => ExitCode::System,
      MpError::RestoreIncomplete { .. } => ExitCode::RestoreIncomplete,
      MpError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      MpError::Config(e) => e.help_message(),
      MpError::Git(e) => e.help_message(),
      MpError::Validation(e) => e.help_message(),
      MpError::Message { help, .. } => help.clone(),
      MpError::RestoreIncomplete { hint, .. } => Some(format!("Finish restoring by hand: {}", hint)),
      _ => None,
    }
  }
}

impl fmt::Display for MpError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MpError::Config(e) => write!(f, "{}", e),
      MpError::Git(e) => write!(f, "{}", e),
      MpError::Validation(e) => write!(f, "{}", e),
      MpError::Io(e) => write!(f, "I/O error: {}", e),
      MpError::RestoreIncomplete { failures, .. } => {
        write!(f, "Archive written, but the working tree was not fully restored:")?;
        for failure in failures {
          write!(f, "\n  - {}", failure)?;
        }
        Ok(())
      }
      MpError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for MpError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      MpError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for MpError {
  fn from(err: io::Error) -> Self {
    MpError::Io(err)
  }
}

impl From<String> for MpError {
  fn from(msg: String) -> Self {
    MpError::message(msg)
  }
}

impl From<&str> for MpError {
  fn from(msg: &str) -> Self {
    MpError::message(msg)
  }
}

impl From<ValidationError> for MpError {
  fn from(err: ValidationError) -> Self {
    MpError::Validation(err)
  }
}

impl From<GitError> for MpError {
  fn from(err: GitError) -> Self {
    MpError::Git(err)
  }
}

impl From<ConfigError> for MpError {
  fn from(err: ConfigError) -> Self {
    MpError::Config(err)
  }
}

impl From<toml_edit::TomlError> for MpError {
  fn from(err: toml_edit::TomlError) -> Self {
    MpError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for MpError {
  fn from(err: toml_edit::de::Error) -> Self {
    MpError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for MpError {
  fn from(err: serde_json::Error) -> Self {
    MpError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for MpError {
  fn from(err: serde_yaml::Error) -> Self {
    MpError::message(format!("YAML error: {}", err))
  }
}

impl From<zip::result::ZipError> for MpError {
  fn from(err: zip::result::ZipError) -> Self {
    MpError::message(format!("Zip archive error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for MpError {
  fn from(err: std::path::StripPrefixError) -> Self {
    MpError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// A config value is present but unusable
  InvalidValue { field: String, reason: String },

  /// Integration directory not found under the configured root
  IntegrationNotFound { name: String, root: PathBuf },

  /// Output directory does not exist
  OutputDirMissing { path: PathBuf },

  /// Requested version is not a decimal number
  InvalidVersion { value: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::IntegrationNotFound { root, .. } => Some(format!(
        "Integrations are looked up under {}. Set [paths] in mp.toml if they live elsewhere.",
        root.display()
      )),
      ConfigError::OutputDirMissing { path } => Some(format!("Create it first: mkdir -p {}", path.display())),
      ConfigError::InvalidVersion { .. } => Some("Pass the version as a decimal, e.g. `-v 12.0`.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidValue { field, reason } => {
        write!(f, "Invalid config value for {}: {}", field, reason)
      }
      ConfigError::IntegrationNotFound { name, root } => {
        write!(f, "Integration '{}' not found under {}", name, root.display())
      }
      ConfigError::OutputDirMissing { path } => {
        write!(f, "Output directory does not exist: {}", path.display())
      }
      ConfigError::InvalidVersion { value } => {
        write!(f, "Invalid version '{}': must be a decimal number", value)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Commit not found locally or on the remote
  CommitNotFound { sha: String },

  /// File does not exist on the reference. Expected for brand-new integrations.
  FileNotFoundOnBranch { path: PathBuf, reference: String },

  /// No commit introduced the requested version
  VersionNotFound { integration: String, version: String },
}

impl GitError {
  /// The only git failure that is an expected state rather than an error
  pub fn is_non_fatal(&self) -> bool {
    matches!(self, GitError::FileNotFoundOnBranch { .. })
  }

  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run mp from inside the marketplace repository (looked at {}).",
        path.display()
      )),
      GitError::VersionNotFound { .. } => {
        Some("Check the version against the integration's release history: git log -- <definition>".to_string())
      }
      GitError::CommitNotFound { .. } => Some("Fetch the full history first: git fetch --all --unshallow".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::CommitNotFound { sha } => {
        write!(f, "Commit not found: {}", sha)
      }
      GitError::FileNotFoundOnBranch { path, reference } => {
        write!(f, "File {} does not exist on {}", path.display(), reference)
      }
      GitError::VersionNotFound { integration, version } => {
        write!(f, "No commit introduced version {} of integration '{}'", version, integration)
      }
    }
  }
}

/// Which serialized form a payload was in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
  Built,
  NonBuilt,
}

impl fmt::Display for Form {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Form::Built => write!(f, "built"),
      Form::NonBuilt => write!(f, "non-built"),
    }
  }
}

/// Validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
  /// A built or non-built payload could not be turned into an entity
  Load {
    form: Form,
    kind: &'static str,
    reason: String,
    /// Trimmed rendering of the offending payload
    payload: String,
    /// File the payload came from, when it came from a file
    path: Option<PathBuf>,
  },

  /// Parameter schema invariant violated
  Parameter { parameter: String, message: String },

  /// Version bump policy violated
  VersionBump { integration: String, message: String },

  /// Package precondition failed at the checked-out commit
  Package { integration: String, message: String },

  /// Summary of a batch run where some integrations failed
  Batch { failed: usize, total: usize },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::VersionBump { .. } => Some(
        "Bump pyproject.toml by exactly 1.0 and tag every new release note with the new version.".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::Load {
        form,
        kind,
        reason,
        payload,
        path,
      } => {
        write!(f, "failed to load {} {}", form, kind)?;
        if let Some(path) = path {
          write!(f, " from {}", path.display())?;
        }
        write!(f, ": {}", reason)?;
        if !payload.is_empty() {
          write!(f, "\npayload: {}", payload)?;
        }
        Ok(())
      }
      ValidationError::Parameter { parameter, message } => {
        write!(f, "parameter '{}': {}", parameter, message)
      }
      ValidationError::VersionBump { integration, message } => {
        write!(f, "{}: {}", integration, message)
      }
      ValidationError::Package { integration, message } => {
        write!(f, "cannot package {}: {}", integration, message)
      }
      ValidationError::Batch { failed, total } => {
        write!(f, "{} of {} integration(s) failed", failed, total)
      }
    }
  }
}

/// Result type alias for mp
pub type MpResult<T> = Result<T, MpError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> MpResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> MpResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<MpError>,
{
  fn context(self, ctx: impl Into<String>) -> MpResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> MpResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &MpError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
