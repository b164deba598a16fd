//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Config
//!     content = /site/content
//!     template = /site/theme/template.html
//!
//! Content
//! index → index.html
//!     Source: index.md
//! Guide (2 pages)
//!     a → Guide/a.html
//!         Source: Guide/a.md
//!     b → Guide/b.html
//!         Source: Guide/b.md
//!
//! Collisions
//!     a.html ← a.html, a.md
//! ```
//!
//! ## Build
//!
//! ```text
//! (root) (1 page)
//!     index.md → index.html
//! Guide (2 pages)
//!     Guide/a.md → Guide/a.html
//!     Guide/b.md SKIPPED: conversion failed: ...
//!
//! Generated 2 pages in 2 directories, copied 3 assets
//! Skipped 1 page
//!     Guide/b.md: conversion failed: ...
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::paths::{ExtensionMap, TargetPath, page_title};
use crate::render::RenderEvent;
use crate::site::BuildReport;
use crate::tree::{Collision, ContentNode};
use std::collections::BTreeMap;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `3 pages`.
fn pages(n: usize) -> String {
    match n {
        1 => "1 page".to_string(),
        n => format!("{} pages", n),
    }
}

fn directory_label(relative_path: &str) -> &str {
    if relative_path.is_empty() {
        "(root)"
    } else {
        relative_path
    }
}

// ============================================================================
// Check: config + content tree
// ============================================================================

/// Format resolved settings, one `key = value` per line.
pub fn format_config(settings: &BTreeMap<&'static str, String>) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    lines.extend(
        settings
            .iter()
            .map(|(key, value)| format!("{}{} = {}", indent(1), key, value)),
    );
    lines
}

/// Format the content tree as an inventory of pages and their targets.
pub fn format_tree(root: &ContentNode, map: &ExtensionMap) -> Vec<String> {
    let mut lines = vec!["Content".to_string()];
    tree_lines(root, map, 0, &mut lines);
    lines
}

fn tree_lines(node: &ContentNode, map: &ExtensionMap, depth: usize, lines: &mut Vec<String>) {
    for file in &node.files {
        let target = TargetPath::for_file(&node.relative_path, file, map);
        lines.push(format!("{}{} → {}", indent(depth), page_title(file), target));
        lines.push(format!("{}Source: {}", indent(depth + 1), node.source_path(file)));
    }
    for child in &node.children {
        let count = child.file_count();
        if count == 0 {
            lines.push(format!("{}{} (empty)", indent(depth), child.name));
        } else {
            lines.push(format!("{}{} ({})", indent(depth), child.name, pages(count)));
        }
        tree_lines(child, map, depth + 1, lines);
    }
}

pub fn format_collisions(collisions: &[Collision]) -> Vec<String> {
    if collisions.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Collisions".to_string()];
    for collision in collisions {
        lines.push(format!(
            "{}{} ← {}",
            indent(1),
            collision.target,
            collision.sources.join(", ")
        ));
    }
    lines
}

pub fn print_check_output(
    settings: &BTreeMap<&'static str, String>,
    root: &ContentNode,
    map: &ExtensionMap,
    collisions: &[Collision],
) {
    let mut lines = format_config(settings);
    lines.push(String::new());
    lines.extend(format_tree(root, map));
    let collision_lines = format_collisions(collisions);
    if !collision_lines.is_empty() {
        lines.push(String::new());
        lines.extend(collision_lines);
    }
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Build: progress + summary
// ============================================================================

pub fn format_render_event(event: &RenderEvent) -> Vec<String> {
    match event {
        RenderEvent::DirectoryEntered {
            relative_path,
            file_count,
        } => vec![format!(
            "{} ({})",
            directory_label(relative_path),
            pages(*file_count)
        )],
        RenderEvent::PageWritten { source, target } => {
            vec![format!("{}{} → {}", indent(1), source, target)]
        }
        RenderEvent::PageSkipped { source, reason } => {
            vec![format!("{}{} SKIPPED: {}", indent(1), source, reason)]
        }
    }
}

pub fn format_build_summary(report: &BuildReport) -> Vec<String> {
    let render = &report.render;
    let mut lines = vec![format!(
        "Generated {} in {} directories, copied {} assets",
        pages(render.written.len()),
        render.directories,
        report.assets.files
    )];
    if !render.skipped.is_empty() {
        lines.push(format!("Skipped {}", pages(render.skipped.len())));
        for page in &render.skipped {
            lines.push(format!("{}{}: {}", indent(1), page.source, page.reason));
        }
    }
    lines
}

pub fn print_build_summary(report: &BuildReport) {
    for line in format_build_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
