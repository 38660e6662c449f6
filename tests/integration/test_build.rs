//! Tests for `mp build` and `mp deconstruct`

use crate::helpers::{TestRepo, mp, run_mp, stdout};
use anyhow::Result;

#[test]
fn test_build_writes_built_layout() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;

  let output = run_mp(&repo.path, &["build", "Echo"])?;
  assert!(stdout(&output).contains("✅ Echo"));

  assert!(repo.file_exists("built/Echo/Integration-Echo.def"));
  assert!(repo.file_exists("built/Echo/RN.json"));
  assert!(repo.file_exists("built/Echo/ActionsDefinitions/ping.actiondef"));
  assert!(repo.file_exists("built/Echo/ActionsScripts/ping.py"));

  let def: serde_json::Value = serde_json::from_str(&repo.read_file("built/Echo/Integration-Echo.def")?)?;
  assert_eq!(def["Identifier"], "Echo");
  assert_eq!(def["DisplayName"], "Echo Service");
  assert_eq!(def["Version"], 1.0);
  assert_eq!(def["Dependencies"][0], "requests>=2.31");

  let region = def["Parameters"]
    .as_array()
    .and_then(|params| params.iter().find(|p| p["Name"] == "Region"))
    .expect("Region parameter is built");
  assert_eq!(region["Type"], 15);
  assert_eq!(region["OptionalValues"][1], "US");

  let notes: serde_json::Value = serde_json::from_str(&repo.read_file("built/Echo/RN.json")?)?;
  assert_eq!(notes[0]["IntroducedInIntegrationVersion"], 1.0);
  assert_eq!(notes[0]["ChangeDescription"], "Change 0");

  let action: serde_json::Value =
    serde_json::from_str(&repo.read_file("built/Echo/ActionsDefinitions/ping.actiondef")?)?;
  assert_eq!(action["IntegrationIdentifier"], "Echo");
  assert_eq!(repo.read_file("built/Echo/ActionsScripts/ping.py")?, "print('pong')\n");

  Ok(())
}

#[test]
fn test_build_replaces_stale_output() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  std::fs::create_dir_all(repo.path.join("built/Echo/ActionsScripts"))?;
  std::fs::write(repo.path.join("built/Echo/ActionsScripts/removed.py"), "old\n")?;

  run_mp(&repo.path, &["build", "Echo"])?;

  assert!(!repo.file_exists("built/Echo/ActionsScripts/removed.py"));
  assert!(repo.file_exists("built/Echo/ActionsScripts/ping.py"));
  Ok(())
}

#[test]
fn test_build_all_reports_every_failure() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  repo.add_integration("Broken", "1.0", &["1.0"])?;
  std::fs::write(
    repo.path.join("integrations/Broken/definition.yaml"),
    "identifier: Broken\nname: Broken\nparameters:\n  - name: Mode\n    type: ddl\n    default_value: Fast\n",
  )?;

  let output = mp(&repo.path, &["build", "--all"])?;
  assert_eq!(output.status.code(), Some(3));

  let out = stdout(&output);
  assert!(out.contains("✅ Echo"), "healthy integration still builds:\n{}", out);
  assert!(out.contains("❌ Broken"), "broken integration is reported:\n{}", out);
  assert!(out.contains("must have optional values"), "reason is shown:\n{}", out);

  assert!(repo.file_exists("built/Echo/Integration-Echo.def"));
  assert!(!repo.file_exists("built/Broken"));
  Ok(())
}

#[test]
fn test_build_unknown_integration_is_user_error() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = mp(&repo.path, &["build", "Missing"])?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}

#[test]
fn test_deconstruct_round_trip() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  run_mp(&repo.path, &["build", "Echo"])?;

  let output = run_mp(&repo.path, &["deconstruct", "Echo", "--out", "restored/Echo"])?;
  assert!(stdout(&output).contains("1 action(s), 1 release note(s)"));

  assert!(repo.file_exists("restored/Echo/pyproject.toml"));
  assert!(repo.file_exists("restored/Echo/definition.yaml"));
  assert!(repo.file_exists("restored/Echo/release_notes.yaml"));
  assert!(repo.file_exists("restored/Echo/actions/ping.yaml"));
  assert!(repo.file_exists("restored/Echo/actions/ping.py"));

  let definition = repo.read_file("restored/Echo/definition.yaml")?;
  assert!(definition.contains("identifier: Echo"));
  assert!(definition.contains("type: ddl"));

  // The deconstructed sources build into the same artifacts
  let original_def = repo.read_file("built/Echo/Integration-Echo.def")?;
  std::fs::remove_dir_all(repo.path.join("integrations/Echo"))?;
  std::fs::rename(repo.path.join("restored/Echo"), repo.path.join("integrations/Echo"))?;
  run_mp(&repo.path, &["build", "Echo"])?;
  assert_eq!(repo.read_file("built/Echo/Integration-Echo.def")?, original_def);

  Ok(())
}

#[test]
fn test_deconstruct_refuses_non_empty_output() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_integration("Echo", "1.0", &["1.0"])?;
  run_mp(&repo.path, &["build", "Echo"])?;

  // Default output is the source directory, which already holds the sources
  let output = mp(&repo.path, &["deconstruct", "Echo"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(repo.read_file("integrations/Echo/actions/ping.py")?, "print('pong')\n");
  Ok(())
}
