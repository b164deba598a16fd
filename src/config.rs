//! Site configuration.
//!
//! A build is described by a small configuration file naming where content
//! lives, where the site goes, and how pages are laid out. Two formats are
//! accepted, chosen by file extension:
//!
//! ```text
//! # site.conf: key=value, one setting per line
//! content=docs
//! output=output_site
//! template=theme/template.html
//! passthrough=false
//! ```
//!
//! ```toml
//! # site.toml: same settings, TOML syntax
//! content_root = "docs"
//! output_dir = "output_site"
//! template = "theme/template.html"
//! ```
//!
//! ## Layouts
//!
//! Exactly one layout must be configured:
//!
//! - `template`: a Jinja template receiving `base_path`, `title`,
//!   `navigation` and `content`.
//! - `header` + `footer`: two HTML fragments spliced around the navigation
//!   and page body. `{{BASE_PATH}}` in the header is replaced with the page's
//!   climb prefix.
//!
//! ## Path Resolution
//!
//! Relative paths in a config file resolve against the directory containing
//! that file, so a site can be built from any working directory.
//!
//! Unknown keys are ignored in both formats. Missing required settings are
//! reported before any content is scanned.

use crate::paths::ExtensionMap;
use crate::tree::AcceptedExtensions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of pages copied into the layout without conversion.
pub const PASSTHROUGH_EXTENSION: &str = "htm";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for `{key}` on line {line}: {value:?}")]
    InvalidValue {
        key: String,
        value: String,
        line: usize,
    },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings for one site build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory holding the source pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_root: Option<PathBuf>,
    /// Directory the site is generated into. Deleted and recreated per build.
    pub output_dir: PathBuf,
    /// Jinja page template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    /// HTML fragment placed before the navigation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<PathBuf>,
    /// HTML fragment placed after the page body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<PathBuf>,
    /// Static assets copied to `<output>/assets`. Defaults to an `assets`
    /// directory next to the template (or header).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_dir: Option<PathBuf>,
    /// Also publish `.htm` pages, spliced into the layout unconverted.
    pub passthrough: bool,
    /// Extension of convertible content files, without the dot.
    pub source_extension: String,
    /// Extension written for converted pages, without the dot.
    pub output_extension: String,
    /// Maximum number of pages rendered in parallel. `None` = all cores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_root: None,
            output_dir: PathBuf::from("output_site"),
            template: None,
            header: None,
            footer: None,
            assets_dir: None,
            passthrough: false,
            source_extension: "md".to_string(),
            output_extension: "html".to_string(),
            jobs: None,
        }
    }
}

/// The page layout a config selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    Template(PathBuf),
    Spliced { header: PathBuf, footer: PathBuf },
}

impl LayoutSource {
    /// Directory the layout files live in; default home of the assets.
    pub fn theme_dir(&self) -> &Path {
        let file = match self {
            LayoutSource::Template(path) => path,
            LayoutSource::Spliced { header, .. } => header,
        };
        file.parent().unwrap_or(Path::new(""))
    }
}

impl SiteConfig {
    /// Validate that a build can start from this config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content_root.is_none() {
            return Err(ConfigError::Missing("content"));
        }
        self.layout()?;
        if self.source_extension.is_empty() || self.output_extension.is_empty() {
            return Err(ConfigError::Validation(
                "source and output extensions must not be empty".into(),
            ));
        }
        if self.source_extension == self.output_extension {
            return Err(ConfigError::Validation(
                "source and output extensions must differ".into(),
            ));
        }
        if self.passthrough && self.source_extension == PASSTHROUGH_EXTENSION {
            return Err(ConfigError::Validation(format!(
                "source extension cannot be the pass-through extension `{PASSTHROUGH_EXTENSION}`"
            )));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Validation("jobs must be at least 1".into()));
        }
        Ok(())
    }

    /// The configured layout: a template, or a header/footer pair.
    pub fn layout(&self) -> Result<LayoutSource, ConfigError> {
        match (&self.template, &self.header, &self.footer) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ConfigError::Validation(
                "configure either `template` or `header`/`footer`, not both".into(),
            )),
            (Some(template), None, None) => Ok(LayoutSource::Template(template.clone())),
            (None, Some(header), Some(footer)) => Ok(LayoutSource::Spliced {
                header: header.clone(),
                footer: footer.clone(),
            }),
            (None, Some(_), None) => Err(ConfigError::Missing("footer")),
            (None, None, Some(_)) => Err(ConfigError::Missing("header")),
            (None, None, None) => Err(ConfigError::Missing("template")),
        }
    }

    pub fn extension_map(&self) -> ExtensionMap {
        ExtensionMap::new(&self.source_extension, &self.output_extension)
    }

    pub fn accepted_extensions(&self) -> AcceptedExtensions {
        if self.passthrough {
            AcceptedExtensions::with_passthrough(&self.source_extension, PASSTHROUGH_EXTENSION)
        } else {
            AcceptedExtensions::content_only(&self.source_extension)
        }
    }

    /// Assets directory: explicit setting, else `assets/` beside the layout.
    pub fn resolved_assets_dir(&self) -> Option<PathBuf> {
        self.assets_dir.clone().or_else(|| {
            self.layout()
                .ok()
                .map(|layout| layout.theme_dir().join("assets"))
        })
    }

    /// Make every relative path absolute against `base`.
    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.output_dir);
        for path in [
            &mut self.content_root,
            &mut self.template,
            &mut self.header,
            &mut self.footer,
            &mut self.assets_dir,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }

    /// Apply parsed `key=value` settings. Unknown keys are ignored.
    fn apply_key_values(&mut self, entries: &[KeyValue]) -> Result<(), ConfigError> {
        for entry in entries {
            match entry.key.as_str() {
                "content" => self.content_root = Some(PathBuf::from(&entry.value)),
                "output" => self.output_dir = PathBuf::from(&entry.value),
                "template" => self.template = Some(PathBuf::from(&entry.value)),
                "header" => self.header = Some(PathBuf::from(&entry.value)),
                "footer" => self.footer = Some(PathBuf::from(&entry.value)),
                "assets" => self.assets_dir = Some(PathBuf::from(&entry.value)),
                "passthrough" => self.passthrough = parse_bool(entry)?,
                "source_ext" => self.source_extension = strip_dot(&entry.value),
                "output_ext" => self.output_extension = strip_dot(&entry.value),
                "jobs" => {
                    self.jobs = Some(entry.value.parse().map_err(|_| entry.invalid())?);
                }
                other => tracing::debug!(key = other, line = entry.line, "ignoring unknown config key"),
            }
        }
        Ok(())
    }
}

fn strip_dot(ext: &str) -> String {
    ext.trim_start_matches('.').to_string()
}

fn parse_bool(entry: &KeyValue) -> Result<bool, ConfigError> {
    match entry.value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(entry.invalid()),
    }
}

/// Resolve the effective render thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(jobs: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    jobs.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// key=value files
// =============================================================================

/// One `key=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    /// 1-based line number, for error messages.
    pub line: usize,
}

impl KeyValue {
    fn invalid(&self) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.key.clone(),
            value: self.value.clone(),
            line: self.line,
        }
    }
}

/// Parse `key=value` text.
///
/// Blank lines, `#` comments and lines without `=` are skipped. Keys and
/// values are trimmed and one pair of matching surrounding quotes is removed
/// from values. Later duplicates win when applied in order.
pub fn parse_key_values(text: &str) -> Vec<KeyValue> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some(KeyValue {
                key: key.trim().to_string(),
                value: unquote(value.trim()).to_string(),
                line: idx + 1,
            })
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

// =============================================================================
// TOML files
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults and deserialize.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    Ok(config)
}

// =============================================================================
// Loading
// =============================================================================

/// Load a config file, choosing the format by extension (`.toml` → TOML,
/// anything else → key=value), and resolve its relative paths.
///
/// The result is not validated: command-line overrides are applied first,
/// then [`SiteConfig::validate`].
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config = if path.extension().is_some_and(|e| e == "toml") {
        let value: toml::Value = toml::from_str(&text)?;
        resolve_config(Some(value))?
    } else {
        let mut config = SiteConfig::default();
        config.apply_key_values(&parse_key_values(&text))?;
        config
    };

    let base = path.parent().unwrap_or(Path::new(""));
    config.resolve_paths(base);
    Ok(config)
}

/// Settings from a key=value file, by key, for display in `check`.
pub fn describe(config: &SiteConfig) -> BTreeMap<&'static str, String> {
    let show = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
    let mut out = BTreeMap::new();
    let mut put = |key, value: Option<String>| {
        if let Some(v) = value {
            out.insert(key, v);
        }
    };
    put("content", show(&config.content_root));
    put("output", Some(config.output_dir.display().to_string()));
    put("template", show(&config.template));
    put("header", show(&config.header));
    put("footer", show(&config.footer));
    put("assets", config.resolved_assets_dir().map(|p| p.display().to_string()));
    put("passthrough", Some(config.passthrough.to_string()));
    put("source_ext", Some(config.source_extension.clone()));
    put("output_ext", Some(config.output_extension.clone()));
    put("jobs", config.jobs.map(|j| j.to_string()));
    out
}

/// Returns a fully-commented stock key=value config.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config() -> &'static str {
    r##"# mdsite configuration
# ====================
# One `key=value` per line. Relative paths resolve against this file's
# directory. Unknown keys are ignored.

# Directory holding the markdown sources (required unless --source is given).
content=content

# Generated site. Deleted and recreated on every build.
output=output_site

# ---------------------------------------------------------------------------
# Layout: set `template`, or both `header` and `footer`.
# ---------------------------------------------------------------------------

# Jinja template. Available variables:
#   {{ base_path }}   "../" per directory level, for stylesheet links
#   {{ title }}       file name without extension
#   {{ navigation }}  the site menu as <ul class="nav-list"> markup
#   {{ content }}     the page body as HTML
template=theme/template.html

# Alternative: splice the page between two fragments.
# {{BASE_PATH}} in the header is replaced with the page's climb prefix.
#header=theme/header.html
#footer=theme/footer.html

# Static files copied to <output>/assets. Defaults to `assets/` next to the
# template (or header).
#assets=theme/assets

# Also publish .htm pages, placed into the layout without conversion.
passthrough=false

# Extension of files converted from markdown, and of the pages written.
source_ext=md
output_ext=html

# Maximum pages rendered in parallel (omit for one per CPU core).
#jobs=4
"##
}
