//! Page layouts: merging a rendered page into the site's HTML shell.
//!
//! Two layouts exist, selected by configuration:
//!
//! - [`TemplateLayout`]: a user-supplied [minijinja](https://docs.rs/minijinja)
//!   template, parsed once at startup and rendered per page with a
//!   [`PageContext`]. Undefined variables are errors.
//! - [`SplicedLayout`]: plain concatenation of a header fragment, the
//!   navigation, the page body and a footer fragment.
//!
//! The template receives navigation and content as raw HTML; the template is
//! registered without auto-escaping so `{{ navigation }}` emits markup.

use crate::config::LayoutSource;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name the page template is registered under. Must not end in `.html`:
/// minijinja auto-escapes templates with that extension.
const TEMPLATE_NAME: &str = "page";

/// Placeholder replaced with the climb prefix in spliced headers.
pub const BASE_PATH_PLACEHOLDER: &str = "{{BASE_PATH}}";

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("cannot read layout file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template syntax error in {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
}

/// A layout failed to produce a page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TemplatingError(pub String);

impl From<minijinja::Error> for TemplatingError {
    fn from(err: minijinja::Error) -> Self {
        let mut message = err.to_string();
        if let Some(detail) = err.detail()
            && !message.contains(detail)
        {
            message = format!("{message}: {detail}");
        }
        TemplatingError(message)
    }
}

/// Everything a layout can place into a page.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    /// Climb prefix to the output root, e.g. `"../"`.
    pub base_path: String,
    /// File name without extension.
    pub title: String,
    /// Navigation markup.
    pub navigation: String,
    /// Page body as HTML.
    pub content: String,
}

pub trait Layout: Send + Sync {
    fn apply(&self, page: &PageContext) -> Result<String, TemplatingError>;
}

/// Jinja page template.
pub struct TemplateLayout {
    env: Environment<'static>,
}

impl TemplateLayout {
    /// Parse template source. Syntax errors surface here, once.
    pub fn parse(source: impl Into<String>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(TEMPLATE_NAME, source.into())?;
        Ok(Self { env })
    }
}

impl Layout for TemplateLayout {
    fn apply(&self, page: &PageContext) -> Result<String, TemplatingError> {
        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(page)?)
    }
}

/// Header + navigation + body + footer.
#[derive(Debug, Clone)]
pub struct SplicedLayout {
    pub header: String,
    pub footer: String,
}

impl Layout for SplicedLayout {
    fn apply(&self, page: &PageContext) -> Result<String, TemplatingError> {
        let header = self.header.replace(BASE_PATH_PLACEHOLDER, &page.base_path);
        Ok(format!(
            "{header}\n\
             <aside class=\"aside\">\n  <nav class=\"nav\">\n{nav}\n  </nav>\n</aside>\n\
             <main class=\"main\">\n{content}\n</main>\n\
             {footer}",
            nav = page.navigation,
            content = page.content,
            footer = self.footer,
        ))
    }
}

fn read(path: &Path) -> Result<String, LayoutError> {
    fs::read_to_string(path).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and prepare the configured layout.
pub fn load_layout(source: &LayoutSource) -> Result<Box<dyn Layout>, LayoutError> {
    match source {
        LayoutSource::Template(path) => {
            let text = read(path)?;
            let layout = TemplateLayout::parse(text).map_err(|source| LayoutError::Syntax {
                path: path.clone(),
                source,
            })?;
            Ok(Box::new(layout))
        }
        LayoutSource::Spliced { header, footer } => Ok(Box::new(SplicedLayout {
            header: read(header)?,
            footer: read(footer)?,
        })),
    }
}
