//! Whole-site builds.
//!
//! [`build`] runs every stage for one [`SiteConfig`]:
//!
//! ```text
//! validate config → load layout → scan content → reset output
//!     → copy assets → render pages
//! ```
//!
//! Everything that can be checked without touching the output directory is
//! checked first, so a misconfigured build leaves a previous site in place.

use crate::assets::{self, ASSETS_DIR, AssetError, CopyOutcome};
use crate::config::{ConfigError, SiteConfig};
use crate::convert::MarkdownConverter;
use crate::layout::{LayoutError, load_layout};
use crate::render::{self, Collaborators, RenderError, RenderEvent, RenderOptions, RenderReport};
use crate::tree::{self, Collision, ContentNode, ScanError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Assets(#[from] AssetError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("output directory {output} overlaps content directory {content}")]
    OutputOverlapsContent { output: PathBuf, content: PathBuf },
}

#[derive(Debug)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub collisions: Vec<Collision>,
    pub assets: CopyOutcome,
    pub render: RenderReport,
}

/// A scanned content tree plus the settings it was scanned with.
#[derive(Debug)]
pub struct ScannedSite {
    pub content_root: PathBuf,
    pub tree: ContentNode,
    pub collisions: Vec<Collision>,
}

/// Validate `config` and scan its content root.
pub fn scan(config: &SiteConfig) -> Result<ScannedSite, BuildError> {
    config.validate()?;
    scan_validated(config)
}

fn scan_validated(config: &SiteConfig) -> Result<ScannedSite, BuildError> {
    let content_root = config
        .content_root
        .clone()
        .ok_or(ConfigError::Missing("content"))?;

    tracing::info!(root = %content_root.display(), "scanning content");
    let tree = tree::build(&content_root, &config.accepted_extensions())?;
    let collisions = tree.collisions(&config.extension_map());
    for collision in &collisions {
        tracing::warn!(
            target_path = %collision.target,
            sources = ?collision.sources,
            "several entries map to one output path"
        );
    }
    Ok(ScannedSite {
        content_root,
        tree,
        collisions,
    })
}

/// Build the site described by `config`.
pub fn build(
    config: &SiteConfig,
    events: Option<Sender<RenderEvent>>,
) -> Result<BuildReport, BuildError> {
    config.validate()?;
    let layout = load_layout(&config.layout()?)?;
    let site = scan_validated(config)?;

    let output_dir = config.output_dir.clone();
    check_overlap(&site.content_root, &output_dir)?;
    reset_dir(&output_dir)?;

    let assets = match config.resolved_assets_dir() {
        Some(src) => assets::copy_tree(&src, &output_dir.join(ASSETS_DIR))?,
        None => CopyOutcome::default(),
    };

    tracing::info!(output = %output_dir.display(), "rendering pages");
    let converter = MarkdownConverter;
    let render = render::render(
        &site.tree,
        &site.content_root,
        &output_dir,
        Collaborators {
            converter: &converter,
            layout: layout.as_ref(),
        },
        &RenderOptions {
            extensions: config.extension_map(),
            jobs: config.jobs,
        },
        events,
    )?;

    Ok(BuildReport {
        output_dir,
        collisions: site.collisions,
        assets,
        render,
    })
}

/// Delete and recreate the output directory.
fn reset_dir(dir: &Path) -> Result<(), BuildError> {
    let io = |source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    };
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(io)?;
    }
    fs::create_dir_all(dir).map_err(io)
}

/// Refuse outputs that contain, or sit inside, the content root.
fn check_overlap(content: &Path, output: &Path) -> Result<(), BuildError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| BuildError::Io { path, source }
    };
    let content_abs = content.canonicalize().map_err(io(content))?;
    let output_abs = if output.exists() {
        output.canonicalize().map_err(io(output))?
    } else {
        std::path::absolute(output).map_err(io(output))?
    };

    if content_abs.starts_with(&output_abs) || output_abs.starts_with(&content_abs) {
        return Err(BuildError::OutputOverlapsContent {
            output: output.to_path_buf(),
            content: content.to_path_buf(),
        });
    }
    Ok(())
}
