//! Static asset synchronization.
//!
//! The theme's asset directory (stylesheets, fonts, images) is copied
//! recursively into `<output>/assets`, overwriting what is there. A theme
//! without assets is normal: a missing source directory copies nothing.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Directory under the output root that receives the theme assets.
pub const ASSETS_DIR: &str = "assets";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("cannot walk asset directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOutcome {
    pub files: usize,
    pub directories: usize,
}

/// Recursively copy `src` into `dst`, creating `dst` as needed.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyOutcome, AssetError> {
    let mut outcome = CopyOutcome::default();
    if !src.is_dir() {
        tracing::info!(path = %src.display(), "no asset directory, skipping");
        return Ok(outcome);
    }

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| AssetError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            outcome.directories += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| AssetError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            outcome.files += 1;
        }
    }

    tracing::debug!(
        files = outcome.files,
        to = %dst.display(),
        "assets copied"
    );
    Ok(outcome)
}
