//! `mp validate`: structural validation and version bump policy

use crate::core::context::RepoContext;
use crate::core::error::{MpError, MpResult, ValidationError};
use crate::ui::progress::BatchProgress;
use crate::validation::{IntegrationReport, validate_all};
use serde::Serialize;

#[derive(Serialize)]
struct ValidateOutput<'a> {
  base_ref: &'a str,
  passed: usize,
  failed: usize,
  integrations: &'a [IntegrationReport],
}

/// Run the validate command
pub fn run_validate(names: Vec<String>, all: bool, changed: bool, base: Option<String>, json: bool) -> MpResult<()> {
  let ctx = RepoContext::build(&std::env::current_dir()?)?;
  let base_ref = base.unwrap_or_else(|| ctx.config.git.base_ref.clone());

  let names = if changed {
    ctx.changed_integrations(&base_ref)?
  } else {
    super::select_integrations(&ctx, names, all)?
  };

  if names.is_empty() {
    if json {
      print_json(&base_ref, &[])?;
    } else {
      println!("✅ No changed integrations relative to {}", base_ref);
    }
    return Ok(());
  }

  if !json {
    println!("🔍 Validating {} integration(s) against {}", names.len(), base_ref);
  }
  let progress = BatchProgress::new(names.len(), "validating", !json);
  let mut reports = validate_all(&ctx, &names, &base_ref, |_| progress.inc())?;
  reports.sort_by(|a, b| a.integration.cmp(&b.integration));

  let failed = reports.iter().filter(|r| !r.is_ok()).count();
  if json {
    print_json(&base_ref, &reports)?;
  } else {
    print_reports(&reports);
  }

  if failed > 0 {
    return Err(MpError::Validation(ValidationError::Batch {
      failed,
      total: reports.len(),
    }));
  }
  Ok(())
}

fn print_json(base_ref: &str, reports: &[IntegrationReport]) -> MpResult<()> {
  let failed = reports.iter().filter(|r| !r.is_ok()).count();
  let output = ValidateOutput {
    base_ref,
    passed: reports.len() - failed,
    failed,
    integrations: reports,
  };
  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

fn print_reports(reports: &[IntegrationReport]) {
  println!();
  for report in reports {
    let version = match (&report.base_version, &report.version) {
      (Some(old), Some(new)) => format!("{} → {}", old, new),
      (None, Some(new)) => format!("new at {}", new),
      _ => "unloaded".to_string(),
    };

    if report.is_ok() {
      println!("✅ {} ({})", report.integration, version);
    } else {
      println!("❌ {} ({})", report.integration, version);
      for error in &report.errors {
        for line in error.lines() {
          println!("   {}", line);
        }
      }
    }
  }

  let failed = reports.iter().filter(|r| !r.is_ok()).count();
  println!();
  if failed == 0 {
    println!("✅ All {} integration(s) passed", reports.len());
  } else {
    println!("⚠️  {} of {} integration(s) failed validation", failed, reports.len());
  }
}
