//! Site navigation markup.
//!
//! Navigation is global: every page gets the menu of the whole site, rendered
//! from the tree root, with links made relative to that page's directory and
//! the page's own entry marked active.
//!
//! ## Markup
//!
//! ```html
//! <ul class="nav-list">
//!   <li><a href="../index.html">index</a></li>         <!-- root file -->
//!   <li><a href="../About/team.html">About</a></li>    <!-- collapsed section -->
//!   <li><strong>Guide</strong>                         <!-- section heading -->
//!     <ul class="nav-list">
//!       <li><a href="../Guide/a.html" class="active">a</a></li>
//!       <li><a href="../Guide/b.html">b</a></li>
//!     </ul>
//!   </li>
//! </ul>
//! ```
//!
//! Only published files are listed: a file whose output path a sibling
//! directory or an earlier sibling file already claims gets no entry, so one
//! page never appears twice.
//!
//! ## Collapsing
//!
//! A directory whose subtree holds exactly one page is rendered as a single
//! link labelled with the directory name, pointing at that page. Any other
//! directory, including an empty one, becomes a non-link heading with its own
//! nested list.

use crate::paths::{ExtensionMap, TargetPath, climb_prefix, page_title};
use crate::tree::ContentNode;
use maud::{Markup, html};
use std::collections::HashMap;

/// Per-page navigation inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigationContext {
    /// Climb prefix of the page being rendered.
    pub url_prefix: String,
    /// Output path of the page being rendered; only used for highlighting.
    pub active_target: TargetPath,
}

impl NavigationContext {
    /// Context for the page at `active_target`, which lives in the content
    /// directory `relative_path`.
    pub fn for_page(relative_path: &str, active_target: TargetPath) -> Self {
        Self {
            url_prefix: climb_prefix(relative_path),
            active_target,
        }
    }
}

/// Render the navigation list for `node` (normally the tree root).
pub fn render_nav(node: &ContentNode, ctx: &NavigationContext, map: &ExtensionMap) -> Markup {
    html! {
        ul.nav-list {
            @for page in node.resolve_files(map).iter().filter(|p| p.is_published()) {
                (nav_link(&page.target, &page_title(page.file), ctx))
            }
            @for child in &node.children {
                @if let Some((dir, file)) = child.sole_file() {
                    (nav_link(&TargetPath::for_file(dir, file, map), &child.name, ctx))
                } @else {
                    li {
                        strong { (child.name) }
                        (render_nav(child, ctx, map))
                    }
                }
            }
        }
    }
}

fn nav_link(target: &TargetPath, label: &str, ctx: &NavigationContext) -> Markup {
    let active = *target == ctx.active_target;
    html! {
        li {
            a href=(target.href(&ctx.url_prefix)) class=[active.then_some("active")] { (label) }
        }
    }
}

/// Memoizes rendered navigation per `(url_prefix, active_target)`.
///
/// Rendering is a pure function of the tree and the context, so a cache hit
/// returns exactly what [`render_nav`] would.
pub struct NavCache<'a> {
    root: &'a ContentNode,
    map: &'a ExtensionMap,
    rendered: HashMap<NavigationContext, String>,
}

impl<'a> NavCache<'a> {
    pub fn new(root: &'a ContentNode, map: &'a ExtensionMap) -> Self {
        Self {
            root,
            map,
            rendered: HashMap::new(),
        }
    }

    pub fn get(&mut self, ctx: &NavigationContext) -> &str {
        let (root, map) = (self.root, self.map);
        self.rendered
            .entry(ctx.clone())
            .or_insert_with(|| render_nav(root, ctx, map).into_string())
    }

    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}
