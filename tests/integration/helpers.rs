//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A marketplace repository with git history
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestRepo {
  /// Create an empty repository on `main` with one commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    std::fs::write(path.join("README.md"), "# Marketplace\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;

    Ok(Self { _root: root, path })
  }

  /// Write a non-built integration under `integrations/<name>`
  ///
  /// `notes` are the `integration_version`s of its release notes, one entry each.
  pub fn add_integration(&self, name: &str, version: &str, notes: &[&str]) -> Result<PathBuf> {
    let dir = self.path.join("integrations").join(name);
    std::fs::create_dir_all(dir.join("actions"))?;

    std::fs::write(
      dir.join("pyproject.toml"),
      format!(
        "[project]\nname = \"{}\"\nversion = \"{}\"\ndependencies = [\"requests>=2.31\"]\n",
        name, version
      ),
    )?;
    std::fs::write(
      dir.join("definition.yaml"),
      format!(
        r#"identifier: {name}
name: {name} Service
description: Talks to {name}
categories: [Enrichment]
parameters:
  - name: API Root
    type: string
    is_mandatory: true
    default_value: https://api.example.com
  - name: Region
    type: ddl
    optional_values: [EU, US]
    default_value: EU
"#
      ),
    )?;
    std::fs::write(
      dir.join("actions").join("ping.yaml"),
      format!("name: Ping\ndescription: Test connectivity\nintegration_identifier: {}\n", name),
    )?;
    std::fs::write(dir.join("actions").join("ping.py"), "print('pong')\n")?;
    self.write_notes(name, notes)?;

    Ok(dir)
  }

  /// Replace an integration's release notes
  pub fn write_notes(&self, name: &str, notes: &[&str]) -> Result<()> {
    let mut yaml = String::new();
    for (i, version) in notes.iter().enumerate() {
      yaml.push_str(&format!(
        "- description: Change {i}\n  integration_version: {version}\n  item_name: Ping\n  item_type: Action\n"
      ));
    }
    let path = self.path.join("integrations").join(name).join("release_notes.yaml");
    std::fs::write(path, yaml)?;
    Ok(())
  }

  /// Set an integration's manifest version
  pub fn set_version(&self, name: &str, version: &str) -> Result<()> {
    let path = self.path.join("integrations").join(name).join("pyproject.toml");
    std::fs::write(
      path,
      format!(
        "[project]\nname = \"{}\"\nversion = \"{}\"\ndependencies = [\"requests>=2.31\"]\n",
        name, version
      ),
    )?;
    Ok(())
  }

  /// Write a built definition the way `mp build` lays it out
  pub fn write_built_definition(&self, name: &str, version: &str) -> Result<()> {
    let dir = self.path.join("built").join(name);
    std::fs::create_dir_all(dir.join("ActionsScripts"))?;
    std::fs::write(
      dir.join(format!("Integration-{}.def", name)),
      format!(
        "{{\n  \"Identifier\": \"{name}\",\n  \"DisplayName\": \"{name}\",\n  \"Version\": {version},\n  \"IsCustom\": false\n}}\n"
      ),
    )?;
    std::fs::write(dir.join("ActionsScripts").join("Ping.py"), format!("VERSION = '{}'\n", version))?;
    Ok(())
  }

  /// Commit everything and return the new HEAD
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn current_branch(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// `git status --porcelain`
  pub fn status(&self) -> Result<String> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run mp, whatever its exit status
pub fn mp(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_mp"))
    .current_dir(cwd)
    .args(args)
    .env("RUST_LOG", "mp=warn")
    .output()
    .context("Failed to run mp")
}

/// Run mp and require success
pub fn run_mp(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = mp(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "mp command failed: mp {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
