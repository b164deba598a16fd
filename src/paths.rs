//! Content path → output path mapping.
//!
//! Every content file has exactly one output location. The mapping is the
//! identity except for the extension: files carrying the designated source
//! extension (`.md` by default) are written with the output extension
//! (`.html`). Everything else, including pass-through `.htm` pages, keeps its
//! name.
//!
//! ```text
//! content/                     output/
//! ├── index.md          →      ├── index.html
//! ├── legacy.htm        →      ├── legacy.htm
//! └── Guide/                   └── Guide/
//!     └── intro.md      →          └── intro.html
//! ```
//!
//! Links between pages are written root-relative and prefixed with a climb
//! prefix (`../` per directory level of the page doing the linking), so the
//! generated site works from any base URL, including `file://`.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// The single path segment that climbs one directory towards the output root.
pub const UP_SEGMENT: &str = "../";

/// Source → output extension rewrite, without leading dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMap {
    pub source: String,
    pub output: String,
}

impl Default for ExtensionMap {
    fn default() -> Self {
        Self {
            source: "md".to_string(),
            output: "html".to_string(),
        }
    }
}

impl ExtensionMap {
    pub fn new(source: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
        }
    }

    /// Whether `name` carries the source extension, i.e. needs conversion.
    pub fn is_source(&self, name: &str) -> bool {
        extension(name) == Some(self.source.as_str())
    }

    /// Map a content file name to its output file name.
    ///
    /// - `intro.md` → `intro.html`
    /// - `legacy.htm` → `legacy.htm`
    /// - `README` → `README`
    pub fn map_target(&self, name: &str) -> String {
        if self.is_source(name) {
            let stem = &name[..name.len() - self.source.len() - 1];
            format!("{}.{}", stem, self.output)
        } else {
            name.to_string()
        }
    }
}

/// Extension of a file name (text after the last dot), ignoring dotfiles
/// such as `.md` whose only dot is the leading one.
pub fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|e| e.to_str())
}

/// File name with its extension stripped, used as page title and nav label.
///
/// `a.b.md` → `a.b`, `intro.md` → `intro`, `README` → `README`.
pub fn page_title(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Number of segments in a forward-slash relative path; `""` has depth 0.
pub fn depth(relative_path: &str) -> usize {
    relative_path.split('/').filter(|s| !s.is_empty()).count()
}

/// The climb prefix for an output directory: one `../` per segment.
///
/// `""` → `""`, `"Guide"` → `"../"`, `"Guide/Advanced"` → `"../../"`.
pub fn climb_prefix(relative_path: &str) -> String {
    UP_SEGMENT.repeat(depth(relative_path))
}

/// Join two forward-slash relative paths, treating `""` as the root.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Output path of a page, relative to the output root, always forward-slash
/// joined with no leading slash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TargetPath(String);

impl TargetPath {
    /// Target of `file` inside the content directory `relative_path`.
    pub fn for_file(relative_path: &str, file: &str, map: &ExtensionMap) -> Self {
        Self(join(relative_path, &map.map_target(file)))
    }

    /// Normalize an externally supplied path: backslashes become slashes,
    /// leading `./` and `/` are dropped, empty segments collapse.
    pub fn parse(path: &str) -> Self {
        let normalized = path
            .replace('\\', "/")
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Link to this target from a page whose climb prefix is `url_prefix`.
    pub fn href(&self, url_prefix: &str) -> String {
        format!("{}{}", url_prefix, self.0)
    }
}

impl fmt::Display for TargetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
