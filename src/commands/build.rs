//! `mp build`: non-built sources -> built artifacts

use crate::core::context::RepoContext;
use crate::core::error::{MpError, MpResult, ValidationError};
use crate::metadata::integration::IntegrationMetadata;
use crate::ui::progress::BatchProgress;
use rayon::prelude::*;
use std::path::PathBuf;

/// Outcome of building one integration
enum Built {
  Ok { name: String, out_dir: PathBuf },
  Failed { name: String, error: String },
}

/// Run the build command
pub fn run_build(names: Vec<String>, all: bool) -> MpResult<()> {
  let ctx = RepoContext::build(&std::env::current_dir()?)?;
  let names = super::select_integrations(&ctx, names, all)?;

  println!("🔨 Building {} integration(s)", names.len());
  let progress = BatchProgress::new(names.len(), "building", true);

  let results = names
    .par_iter()
    .map(|name| -> MpResult<Built> {
      let built = build_one(&ctx, name);
      progress.inc();
      built
    })
    .collect::<MpResult<Vec<_>>>()?;

  println!();
  let mut failed = 0;
  for result in &results {
    match result {
      Built::Ok { name, out_dir } => {
        let shown = out_dir.strip_prefix(&ctx.root).unwrap_or(out_dir);
        println!("✅ {} → {}", name, shown.display());
      }
      Built::Failed { name, error } => {
        failed += 1;
        println!("❌ {}", name);
        for line in error.lines() {
          println!("   {}", line);
        }
      }
    }
  }

  if failed > 0 {
    return Err(MpError::Validation(ValidationError::Batch {
      failed,
      total: results.len(),
    }));
  }
  Ok(())
}

fn build_one(ctx: &RepoContext, name: &str) -> MpResult<Built> {
  let source = ctx.source_dir(name)?;
  let metadata = match IntegrationMetadata::from_non_built_path(&source) {
    Ok(metadata) => metadata,
    Err(e) if e.is_non_fatal() => {
      return Ok(Built::Failed {
        name: name.to_string(),
        error: e.to_string(),
      });
    }
    Err(e) => return Err(e),
  };

  let out_dir = ctx.built_dir(metadata.identifier());
  metadata.write_built(&source, &out_dir)?;
  tracing::debug!(integration = name, out = %out_dir.display(), actions = metadata.actions.len(), "built integration");

  Ok(Built::Ok {
    name: name.to_string(),
    out_dir,
  })
}
