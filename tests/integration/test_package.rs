//! Tests for `mp package`

use crate::helpers::{TestRepo, mp, run_mp, stderr, stdout};
use anyhow::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

/// `Echo` released at 1.0, 2.0 and 3.0, one commit each, checked out on main
fn released_repo() -> Result<(TestRepo, Vec<String>)> {
  let repo = TestRepo::new()?;
  let mut commits = Vec::new();
  for version in ["1.0", "2.0", "3.0"] {
    repo.write_built_definition("Echo", version)?;
    commits.push(repo.commit(&format!("Release Echo {}", version))?);
  }
  Ok((repo, commits))
}

fn read_entry(archive: &Path, name: &str) -> Result<String> {
  let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
  let mut entry = zip.by_name(name)?;
  let mut content = String::new();
  entry.read_to_string(&mut content)?;
  Ok(content)
}

#[test]
fn test_package_rebuilds_released_version() -> Result<()> {
  let (repo, commits) = released_repo()?;
  let out = TempDir::new()?;
  let out_dir = out.path().to_string_lossy().to_string();

  let output = run_mp(&repo.path, &["package", "-i", "Echo", "-v", "2.0", "-d", &out_dir])?;
  assert!(stdout(&output).contains("✅ Wrote"));

  let archive = out.path().join("Echo_V2-0.zip");
  assert!(archive.is_file(), "archive is named after the version");

  let definition: serde_json::Value = serde_json::from_str(&read_entry(&archive, "Integration-Echo.def")?)?;
  assert_eq!(definition["Version"], 2.0);
  assert_eq!(definition["IsCustom"], true);
  assert_eq!(read_entry(&archive, "ActionsScripts/Ping.py")?, "VERSION = '2.0'\n");

  // Working tree is back where it was
  assert_eq!(repo.current_branch()?, "main");
  assert_eq!(repo.status()?, "");
  let on_disk: serde_json::Value = serde_json::from_str(&repo.read_file("built/Echo/Integration-Echo.def")?)?;
  assert_eq!(on_disk["Version"], 3.0);
  assert_eq!(on_disk["IsCustom"], false);

  let output = run_mp(&repo.path, &["package", "-i", "Echo", "-v", "2.0", "-d", &out_dir, "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["commit"], commits[1].as_str());
  assert_eq!(report["version"], "2.0");
  assert_eq!(report["archive"]["files"], 2);
  Ok(())
}

#[test]
fn test_package_keeps_local_changes() -> Result<()> {
  let (repo, _) = released_repo()?;
  let out = TempDir::new()?;
  std::fs::write(repo.path.join("README.md"), "# Marketplace\n\nwork in progress\n")?;

  run_mp(
    &repo.path,
    &["package", "-i", "Echo", "-v", "1.0", "-d", &out.path().to_string_lossy()],
  )?;

  assert!(out.path().join("Echo_V1-0.zip").is_file());
  assert_eq!(repo.current_branch()?, "main");
  assert_eq!(repo.read_file("README.md")?, "# Marketplace\n\nwork in progress\n");
  assert_eq!(repo.status()?, "M README.md");
  Ok(())
}

#[test]
fn test_package_defaults_to_repository_root() -> Result<()> {
  let (repo, _) = released_repo()?;
  std::fs::create_dir_all(repo.path.join("docs"))?;
  std::fs::write(repo.path.join("docs/usage.md"), "# Usage\n")?;
  repo.commit("Add docs")?;

  // docs/ does not exist at the 1.0 release commit
  let docs = repo.path.join("docs");
  let output = mp(&docs, &["package", "-i", "Echo", "-v", "1.0"])?;
  assert!(output.status.success(), "package failed:\n{}", stderr(&output));

  assert!(repo.file_exists("Echo_V1-0.zip"), "archive lands in the repository root");
  assert!(!repo.file_exists("docs/Echo_V1-0.zip"));
  assert_eq!(repo.current_branch()?, "main");
  assert_eq!(repo.read_file("docs/usage.md")?, "# Usage\n");
  assert_eq!(repo.status()?, "?? Echo_V1-0.zip");
  Ok(())
}

#[test]
fn test_package_unknown_version() -> Result<()> {
  let (repo, _) = released_repo()?;
  let out = TempDir::new()?;

  let output = mp(
    &repo.path,
    &["package", "-i", "Echo", "-v", "9.0", "-d", &out.path().to_string_lossy()],
  )?;
  assert_eq!(output.status.code(), Some(2));
  assert_eq!(repo.current_branch()?, "main");
  assert!(!out.path().join("Echo_V9-0.zip").exists());
  Ok(())
}

#[test]
fn test_package_requires_release_notes_when_asked() -> Result<()> {
  let (repo, _) = released_repo()?;
  let out = TempDir::new()?;

  let output = mp(
    &repo.path,
    &[
      "package",
      "-i",
      "Echo",
      "-v",
      "2.0",
      "-d",
      &out.path().to_string_lossy(),
      "--raise-python-migration-rn",
    ],
  )?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("no release notes"));

  // Failure after checkout still restores the working tree
  assert_eq!(repo.current_branch()?, "main");
  assert_eq!(repo.status()?, "");
  assert!(!out.path().join("Echo_V2-0.zip").exists());
  Ok(())
}

#[test]
fn test_package_rejects_bad_arguments_before_git() -> Result<()> {
  let (repo, _) = released_repo()?;
  let out = TempDir::new()?;

  let output = mp(
    &repo.path,
    &["package", "-i", "Echo", "-v", "two", "-d", &out.path().to_string_lossy()],
  )?;
  assert_eq!(output.status.code(), Some(1));

  let missing = out.path().join("missing");
  let output = mp(
    &repo.path,
    &["package", "-i", "Echo", "-v", "2.0", "-d", &missing.to_string_lossy()],
  )?;
  assert_eq!(output.status.code(), Some(1));

  // Outside a repository, argument errors still win over the missing repository
  let outside = TempDir::new()?;
  let output = mp(outside.path(), &["package", "-i", "Echo", "-v", "two"])?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}
