//! Tests for `mp validate`

use crate::helpers::{TestRepo, git, mp, run_mp, stdout};
use anyhow::Result;

/// Repository with `Echo` released at 1.0 on main, checked out on a feature branch
fn released_repo() -> Result<TestRepo> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  repo.commit("Add Echo")?;
  git(&repo.path, &["checkout", "-b", "feature"])?;
  Ok(repo)
}

#[test]
fn test_new_integration_at_initial_version_passes() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Fresh", "1.0", &["1.0"])?;

  let output = run_mp(&repo.path, &["validate", "Fresh"])?;
  assert!(stdout(&output).contains("✅"));
  Ok(())
}

#[test]
fn test_new_integration_must_start_at_initial_version() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Fresh", "2.0", &["2.0"])?;

  let output = mp(&repo.path, &["validate", "Fresh"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).contains("must initialize to 1.0"));
  Ok(())
}

#[test]
fn test_bump_by_one_with_matching_note_passes() -> Result<()> {
  let repo = released_repo()?;
  repo.set_version("Echo", "2.0")?;
  repo.write_notes("Echo", &["1.0", "2.0"])?;

  run_mp(&repo.path, &["validate", "Echo"])?;
  Ok(())
}

#[test]
fn test_bump_by_two_fails() -> Result<()> {
  let repo = released_repo()?;
  repo.set_version("Echo", "3.0")?;
  repo.write_notes("Echo", &["1.0", "3.0"])?;

  let output = mp(&repo.path, &["validate", "Echo"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).contains("must be incremented by exactly 1.0"));
  Ok(())
}

#[test]
fn test_new_note_must_match_new_version() -> Result<()> {
  let repo = released_repo()?;
  repo.set_version("Echo", "2.0")?;
  repo.write_notes("Echo", &["1.0", "3.0"])?;

  let output = mp(&repo.path, &["validate", "Echo"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stdout(&output).contains("release note's version must match"));
  Ok(())
}

#[test]
fn test_validate_json_reports_each_integration() -> Result<()> {
  let repo = released_repo()?;
  repo.add_integration("Fresh", "1.0", &["1.0"])?;
  repo.set_version("Echo", "3.0")?;

  let output = mp(&repo.path, &["validate", "--all", "--json"])?;
  assert_eq!(output.status.code(), Some(3));

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["base_ref"], "main");
  assert_eq!(report["passed"], 1);
  assert_eq!(report["failed"], 1);

  let integrations = report["integrations"].as_array().expect("integrations array");
  assert_eq!(integrations.len(), 2);
  assert_eq!(integrations[0]["integration"], "Echo");
  assert_eq!(integrations[0]["base_version"], "1.0");
  assert_eq!(integrations[0]["version"], "3.0");
  assert_eq!(integrations[0]["errors"].as_array().map(Vec::len), Some(1));
  assert_eq!(integrations[1]["integration"], "Fresh");
  assert!(integrations[1]["base_version"].is_null());
  Ok(())
}

#[test]
fn test_changed_selects_only_touched_integrations() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  repo.add_integration("Other", "1.0", &["1.0"])?;
  repo.commit("Add integrations")?;
  git(&repo.path, &["checkout", "-b", "feature"])?;

  let output = run_mp(&repo.path, &["validate", "--changed"])?;
  assert!(stdout(&output).contains("No changed integrations"));

  repo.set_version("Echo", "2.0")?;
  repo.write_notes("Echo", &["1.0", "2.0"])?;
  let output = run_mp(&repo.path, &["validate", "--changed", "--json"])?;

  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  let names: Vec<_> = report["integrations"]
    .as_array()
    .expect("integrations array")
    .iter()
    .map(|r| r["integration"].as_str().unwrap_or_default().to_string())
    .collect();
  assert_eq!(names, vec!["Echo".to_string()]);
  Ok(())
}

#[test]
fn test_base_ref_from_config() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  repo.commit("Add Echo")?;
  git(&repo.path, &["branch", "release"])?;
  repo.set_version("Echo", "2.0")?;
  repo.write_notes("Echo", &["1.0", "2.0"])?;
  repo.commit("Release Echo 2.0")?;
  git(&repo.path, &["checkout", "-b", "feature"])?;
  std::fs::write(repo.path.join("mp.toml"), "[git]\nbase_ref = \"release\"\n")?;

  // 2.0 is one ahead of the release branch, two ahead would fail
  run_mp(&repo.path, &["validate", "Echo"])?;

  let output = mp(&repo.path, &["validate", "Echo", "--base", "release", "--json"])?;
  let report: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(report["base_ref"], "release");
  assert_eq!(report["integrations"][0]["base_version"], "1.0");
  Ok(())
}
