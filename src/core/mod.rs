//! Core engine for mp operations
//!
//! - **config**: mp.toml parsing and validation
//! - **context**: Repository context shared across commands
//! - **error**: Error types with contextual help messages and exit codes
//! - **vcs**: Git operations behind the `VersionControl` trait (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
