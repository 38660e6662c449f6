//! Zip packaging of a built integration directory

use crate::core::error::{MpResult, ResultExt};
use crate::metadata::version::IntegrationVersion;
use crate::utils::path_to_git_format;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// What was written
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
  pub path: PathBuf,
  /// Number of file entries (directories not counted)
  pub files: usize,
  pub bytes: u64,
  pub sha256: String,
}

/// `<integration>_V<version with dashes>.zip`, e.g. `VirusTotal_V12-0.zip`
pub fn archive_name(integration: &str, version: IntegrationVersion) -> String {
  format!("{}_V{}.zip", integration, version.dashed())
}

/// Zip `src` recursively into `dest`; entry names are relative to `src`
pub fn zip_directory(src: &Path, dest: &Path) -> MpResult<ArchiveSummary> {
  let mut entries = Vec::new();
  collect_entries(src, src, &mut entries)?;

  let file = File::create(dest).with_context(|| format!("Failed to create archive {}", dest.display()))?;
  let mut writer = zip::ZipWriter::new(BufWriter::new(file));
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  let mut files = 0;
  for entry in &entries {
    let relative = entry.strip_prefix(src)?;
    let name = path_to_git_format(relative);
    if entry.is_dir() {
      writer.add_directory(format!("{}/", name), options)?;
    } else {
      let content = fs::read(entry).with_context(|| format!("Failed to read {}", entry.display()))?;
      writer.start_file(name, options)?;
      writer.write_all(&content)?;
      files += 1;
    }
  }

  let mut inner = writer.finish()?;
  inner.flush()?;
  drop(inner);

  let bytes = fs::read(dest).with_context(|| format!("Failed to read back {}", dest.display()))?;
  let mut hasher = Sha256::new();
  hasher.update(&bytes);

  Ok(ArchiveSummary {
    path: dest.to_path_buf(),
    files,
    bytes: bytes.len() as u64,
    sha256: format!("{:x}", hasher.finalize()),
  })
}

/// Depth-first, sorted, so archives of identical trees list identical entries
fn collect_entries(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> MpResult<()> {
  let mut children = fs::read_dir(dir)
    .with_context(|| format!("Failed to list {}", dir.display()))?
    .map(|entry| entry.map(|e| e.path()))
    .collect::<Result<Vec<_>, _>>()?;
  children.sort();

  for child in children {
    if child.is_dir() {
      out.push(child.clone());
      collect_entries(root, &child, out)?;
    } else {
      out.push(child);
    }
  }
  Ok(())
}
