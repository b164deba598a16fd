//! Shared test utilities for the mdsite test suite.
//!
//! Provides content fixture builders, tree lookups, and navigation markup
//! queries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = content_dir(&["index.md", "Guide/a.md", "Guide/b.md"]);
//! let root = tree::build(tmp.path(), &accepted).unwrap();
//! let guide = find_child(&root, "Guide");
//!
//! let html = render_nav(&root, &ctx, &map).into_string();
//! assert_eq!(active_count(&html), 1);
//! assert_eq!(nested_list_count(&html), 1);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::paths::{self, page_title};
use crate::tree::ContentNode;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding the given relative file paths.
///
/// Parent directories are created as needed. Each file contains a level-one
/// heading with its title, e.g. `Guide/intro.md` holds `# intro`.
pub fn content_dir(files: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for file in files {
        let path = tmp.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let name = file.rsplit('/').next().unwrap_or(file);
        fs::write(&path, format!("# {}\n", page_title(name))).unwrap();
    }
    tmp
}

/// Copy `fixtures/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// In-memory trees
// =========================================================================

/// Build a sorted content tree from relative file paths, without touching
/// the filesystem. Every file is kept regardless of extension.
pub fn tree(files: &[&str]) -> ContentNode {
    let mut root = node("", "");
    for file in files {
        let mut segments: Vec<&str> = file.split('/').collect();
        let name = segments.pop().unwrap();
        let mut current = &mut root;
        for segment in segments {
            let idx = match current.children.iter().position(|c| c.name == segment) {
                Some(idx) => idx,
                None => {
                    let relative = paths::join(&current.relative_path, segment);
                    current.children.push(node(&relative, segment));
                    current.children.len() - 1
                }
            };
            current = &mut current.children[idx];
        }
        current.files.push(name.to_string());
    }
    sort(&mut root);
    root
}

fn node(relative_path: &str, name: &str) -> ContentNode {
    ContentNode {
        relative_path: relative_path.to_string(),
        name: name.to_string(),
        files: Vec::new(),
        children: Vec::new(),
    }
}

fn sort(node: &mut ContentNode) {
    node.files.sort();
    node.children.sort_by(|a, b| a.name.cmp(&b.name));
    node.children.iter_mut().for_each(sort);
}

// =========================================================================
// Tree lookups: panics with a clear message on miss
// =========================================================================

/// Find a direct child directory by name. Panics if not found.
pub fn find_child<'a>(node: &'a ContentNode, name: &str) -> &'a ContentNode {
    node.children
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
            panic!("directory '{name}' not found. Available: {names:?}")
        })
}

// =========================================================================
// Navigation markup queries
// =========================================================================

/// Number of `<ul>` lists nested inside the outermost one.
pub fn nested_list_count(html: &str) -> usize {
    html.matches("<ul").count().saturating_sub(1)
}

/// Every `href` value, in document order.
pub fn all_hrefs(html: &str) -> Vec<String> {
    html.split("href=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

/// Number of links marked active.
pub fn active_count(html: &str) -> usize {
    html.matches("class=\"active\"").count()
}

/// `href` of the active link, if any.
pub fn active_href(html: &str) -> Option<String> {
    let (before, _) = html.split_once("class=\"active\"")?;
    let start = before.rfind("href=\"")? + "href=\"".len();
    before[start..].split('"').next().map(str::to_string)
}
