//! # mdsite
//!
//! A small static site generator: point it at a directory of markdown and it
//! produces a browsable HTML site with the same shape. Your filesystem is the
//! data source: directories become navigation sections, files become pages,
//! and every page carries a menu of the whole site.
//!
//! # Pipeline
//!
//! ```text
//! 1. Scan      content/  →  ContentNode tree      (sorted, filtered)
//! 2. Reset     output/   →  empty output dir      (+ theme assets copied in)
//! 3. Render    tree      →  output/**.html        (convert, navigate, lay out)
//! ```
//!
//! The scan result is an owned tree that nothing mutates after it is built, so
//! rendering can fan out across threads: every page reads the same tree and
//! writes its own file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Content path → output path mapping, climb prefixes |
//! | [`tree`] | Walks the content root into a sorted [`tree::ContentNode`] |
//! | [`nav`] | Renders the site navigation for one page using Maud |
//! | [`convert`] | Markdown → HTML through pulldown-cmark |
//! | [`layout`] | Merges a page into a Jinja template or header/footer shell |
//! | [`render`] | Plans and renders every page, skipping pages that fail |
//! | [`assets`] | Copies theme assets into the output |
//! | [`site`] | Runs a whole build from a [`config::SiteConfig`] |
//! | [`config`] | `key=value` and TOML config loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Relative Links Everywhere
//!
//! Every link is written relative to the page containing it (`../` per
//! directory level). The generated site works from any base URL, a
//! subdirectory of a web server, or straight from disk over `file://`.
//!
//! ## Per-Page Failures Don't Stop the Build
//!
//! A page that fails to convert or lay out is reported and skipped; the rest
//! of the site is still written. Only problems that make the whole output
//! untrustworthy (unreadable sources, unwritable output, a broken template)
//! abort the run.
//!
//! ## Maud for Navigation, Jinja for Pages
//!
//! Navigation markup is fixed and generated with [Maud](https://maud.lambda.xyz/),
//! so labels are escaped and the structure is checked at compile time. The page
//! shell belongs to the site author and is loaded at runtime with
//! [minijinja](https://docs.rs/minijinja).

pub mod assets;
pub mod config;
pub mod convert;
pub mod layout;
pub mod nav;
pub mod output;
pub mod paths;
pub mod render;
pub mod site;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
