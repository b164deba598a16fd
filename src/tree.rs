//! Content tree discovery.
//!
//! Walks the content root once and produces an owned, sorted tree of
//! directories and eligible content files. The tree is the only input the
//! navigation renderer and the render pipeline read, so its ordering decides
//! navigation order:
//!
//! - `files` are sorted by file name, `children` by directory name, both with
//!   plain byte ordering (no locale, no natural sort), so two scans of an
//!   unchanged directory yield identical trees on every platform.
//! - Only files whose extension is in [`AcceptedExtensions`] are kept.
//! - Hidden entries (leading `.`) are skipped entirely.
//!
//! Empty directories are kept: they still show up in navigation as an empty
//! section.

use crate::paths::{self, ExtensionMap, TargetPath};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("entry name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),
}

/// The set of file extensions the scanner keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedExtensions {
    extensions: Vec<String>,
}

impl AcceptedExtensions {
    /// Only convertible content files, e.g. `{md}`.
    pub fn content_only(content: &str) -> Self {
        Self {
            extensions: vec![content.to_string()],
        }
    }

    /// Convertible content plus pages copied into the layout verbatim,
    /// e.g. `{md, htm}`.
    pub fn with_passthrough(content: &str, passthrough: &str) -> Self {
        Self {
            extensions: vec![content.to_string(), passthrough.to_string()],
        }
    }

    pub fn accepts(&self, name: &str) -> bool {
        paths::extension(name).is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// One directory of the content tree, the root included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentNode {
    /// Forward-slash path relative to the content root; `""` for the root.
    pub relative_path: String,
    /// The directory's own name; empty for the root.
    pub name: String,
    pub files: Vec<String>,
    pub children: Vec<ContentNode>,
}

/// Two or more files of one directory resolving to the same output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub target: TargetPath,
    /// Source paths relative to the content root, in sorted order.
    pub sources: Vec<String>,
}

impl ContentNode {
    /// Number of eligible files in this directory and all descendants.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.children.iter().map(ContentNode::file_count).sum::<usize>()
    }

    /// Whether the subtree holds no eligible file at all.
    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    /// The single file of a subtree holding exactly one, as
    /// `(directory relative path, file name)`.
    pub fn sole_file(&self) -> Option<(&str, &str)> {
        if self.file_count() != 1 {
            return None;
        }
        match self.files.first() {
            Some(file) => Some((self.relative_path.as_str(), file.as_str())),
            None => self.children.iter().find_map(ContentNode::sole_file),
        }
    }

    /// Source path of one of this node's files, relative to the content root.
    pub fn source_path(&self, file: &str) -> String {
        paths::join(&self.relative_path, file)
    }

    /// Pre-order iterator over this node and all descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Output path of this directory, as a page target would name it.
    pub fn output_path(&self) -> TargetPath {
        TargetPath::parse(&self.relative_path)
    }

    /// Resolve this directory's files against their output paths.
    ///
    /// Subdirectories claim their own paths first, then files claim targets in
    /// sorted order. A file whose target is already claimed carries the
    /// claimant in `taken_by`; directories are named with a trailing `/`.
    pub fn resolve_files(&self, map: &ExtensionMap) -> Vec<ResolvedFile<'_>> {
        let mut claimed: HashMap<TargetPath, String> = self
            .children
            .iter()
            .map(|child| (child.output_path(), format!("{}/", child.relative_path)))
            .collect();
        self.files
            .iter()
            .map(|file| {
                let target = TargetPath::for_file(&self.relative_path, file, map);
                let taken_by = match claimed.get(&target) {
                    Some(first) => Some(first.clone()),
                    None => {
                        claimed.insert(target.clone(), self.source_path(file));
                        None
                    }
                };
                ResolvedFile {
                    file,
                    target,
                    taken_by,
                }
            })
            .collect()
    }

    /// Entries that map onto the same output path, across the whole subtree.
    ///
    /// Only siblings can collide, since the mapping keeps directory structure
    /// and only rewrites extensions. A directory sharing a page's path is
    /// listed first, with a trailing `/`.
    pub fn collisions(&self, map: &ExtensionMap) -> Vec<Collision> {
        let mut found = Vec::new();
        for node in self.walk() {
            let mut by_target: BTreeMap<TargetPath, Vec<String>> = BTreeMap::new();
            for child in &node.children {
                by_target
                    .entry(child.output_path())
                    .or_default()
                    .push(format!("{}/", child.relative_path));
            }
            for file in &node.files {
                by_target
                    .entry(TargetPath::for_file(&node.relative_path, file, map))
                    .or_default()
                    .push(node.source_path(file));
            }
            found.extend(
                by_target
                    .into_iter()
                    .filter(|(_, sources)| sources.len() > 1)
                    .map(|(target, sources)| Collision { target, sources }),
            );
        }
        found
    }
}

/// One file of a directory with its output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile<'a> {
    pub file: &'a str,
    pub target: TargetPath,
    /// Sibling that already owns `target`; this file is not published.
    pub taken_by: Option<String>,
}

impl ResolvedFile<'_> {
    pub fn is_published(&self) -> bool {
        self.taken_by.is_none()
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a ContentNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a ContentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Scan `root` into a content tree.
pub fn build(root: &Path, accepted: &AcceptedExtensions) -> Result<ContentNode, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    scan_directory(root, String::new(), String::new(), accepted)
}

fn scan_directory(
    path: &Path,
    relative_path: String,
    name: String,
    accepted: &AcceptedExtensions,
) -> Result<ContentNode, ScanError> {
    let read_err = |source| ScanError::ReadDir {
        path: path.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(path).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let entry_path = entry.path();
        let entry_name = entry
            .file_name()
            .into_string()
            .map_err(|_| ScanError::NonUtf8Name(entry_path.clone()))?;

        if entry_name.starts_with('.') {
            continue;
        }

        if entry_path.is_dir() {
            subdirs.push((entry_path, entry_name));
        } else if entry_path.is_file() && accepted.accepts(&entry_name) {
            files.push(entry_name);
        }
    }

    files.sort();
    subdirs.sort_by(|a, b| a.1.cmp(&b.1));

    let children = subdirs
        .into_iter()
        .map(|(child_path, child_name)| {
            let child_relative = paths::join(&relative_path, &child_name);
            scan_directory(&child_path, child_relative, child_name, accepted)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContentNode {
        relative_path,
        name,
        files,
        children,
    })
}
