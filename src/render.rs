//! Page rendering: content tree → output tree.
//!
//! Rendering runs in two phases:
//!
//! 1. **Plan** (sequential): walk the tree in pre-order, create every output
//!    directory (empty ones included), and turn each file into a [`PageJob`].
//!    Output-path collisions are settled here: the first file in sorted order
//!    claims the target, later ones are skipped.
//! 2. **Render** (parallel): jobs run on a [rayon](https://docs.rs/rayon)
//!    pool. Each job reads its source, converts it when it carries the source
//!    extension, renders the site navigation for its location, applies the
//!    layout and writes the page. Jobs share only immutable data and write
//!    distinct files.
//!
//! Page events are sent as workers finish, so their order varies between
//! runs. The report and the first fatal error follow plan order and are the
//! same for every thread count.
//!
//! ## Failure Model
//!
//! A page that cannot be converted or laid out is skipped and reported; the
//! run carries on. Failing to read a source, write a page or create a
//! directory aborts the run with a [`RenderError`].

use crate::config::effective_threads;
use crate::convert::{self, ConversionError, Converter};
use crate::layout::{Layout, PageContext, TemplatingError};
use crate::nav::{NavigationContext, render_nav};
use crate::paths::{ExtensionMap, TargetPath, climb_prefix, page_title};
use crate::tree::ContentNode;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// A page that was not written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("layout failed: {0}")]
    Templating(#[from] TemplatingError),
    #[error("output path {target} is already taken by {with}")]
    Collision { target: TargetPath, with: String },
}

/// Errors that abort the whole render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot start render threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The pluggable parts of a render.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub converter: &'a dyn Converter,
    pub layout: &'a dyn Layout,
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub extensions: ExtensionMap,
    /// Render thread cap; see [`effective_threads`].
    pub jobs: Option<usize>,
}

/// Progress notifications. Directory events come in plan order, page events
/// as pages finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    DirectoryEntered {
        relative_path: String,
        file_count: usize,
    },
    PageWritten {
        source: String,
        target: TargetPath,
    },
    PageSkipped {
        source: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    /// Source path relative to the content root.
    pub source: String,
    pub target: TargetPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub source: String,
    pub reason: PageError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub directories: usize,
    pub written: Vec<WrittenPage>,
    pub skipped: Vec<SkippedPage>,
}

impl RenderReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// One page to render.
#[derive(Debug, Clone)]
struct PageJob {
    source: String,
    source_path: PathBuf,
    target: TargetPath,
    nav: NavigationContext,
    title: String,
    convert: bool,
}

/// What the planning pass produces, in pre-order.
#[derive(Default)]
struct Plan {
    directories: usize,
    jobs: Vec<PageJob>,
    skipped: Vec<SkippedPage>,
}

/// Render every page of `root` into `output_root`.
///
/// `output_root` must exist. Pages already present there are overwritten.
pub fn render(
    root: &ContentNode,
    content_root: &Path,
    output_root: &Path,
    collaborators: Collaborators<'_>,
    options: &RenderOptions,
    events: Option<Sender<RenderEvent>>,
) -> Result<RenderReport, RenderError> {
    let emit = |event: RenderEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    let mut plan = Plan::default();
    plan_node(root, content_root, output_root, &options.extensions, &mut plan, &emit)?;
    tracing::debug!(
        directories = plan.directories,
        pages = plan.jobs.len(),
        "render planned"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(effective_threads(options.jobs))
        .build()?;
    let outcomes: Vec<Result<Result<(), PageError>, RenderError>> = pool.install(|| {
        plan.jobs
            .par_iter()
            .map(|job| {
                let outcome =
                    render_page(job, root, output_root, collaborators, &options.extensions);
                match &outcome {
                    Ok(Ok(())) => emit(RenderEvent::PageWritten {
                        source: job.source.clone(),
                        target: job.target.clone(),
                    }),
                    Ok(Err(reason)) => {
                        tracing::warn!(source = %job.source, %reason, "page skipped");
                        emit(RenderEvent::PageSkipped {
                            source: job.source.clone(),
                            reason: reason.to_string(),
                        });
                    }
                    Err(_) => {}
                }
                outcome
            })
            .collect()
    });

    let mut report = RenderReport {
        directories: plan.directories,
        written: Vec::new(),
        skipped: plan.skipped,
    };
    for (job, outcome) in plan.jobs.into_iter().zip(outcomes) {
        match outcome? {
            Ok(()) => report.written.push(WrittenPage {
                source: job.source,
                target: job.target,
            }),
            Err(reason) => report.skipped.push(SkippedPage {
                source: job.source,
                reason,
            }),
        }
    }
    Ok(report)
}

fn plan_node(
    node: &ContentNode,
    content_root: &Path,
    output_root: &Path,
    map: &ExtensionMap,
    plan: &mut Plan,
    emit: &impl Fn(RenderEvent),
) -> Result<(), RenderError> {
    let out_dir = output_root.join(&node.relative_path);
    fs::create_dir_all(&out_dir).map_err(io_err(&out_dir))?;
    plan.directories += 1;
    tracing::debug!(dir = %node.relative_path, files = node.files.len(), "entering directory");
    emit(RenderEvent::DirectoryEntered {
        relative_path: node.relative_path.clone(),
        file_count: node.files.len(),
    });

    for resolved in node.resolve_files(map) {
        let source = node.source_path(resolved.file);
        let target = resolved.target;

        if let Some(with) = resolved.taken_by {
            let reason = PageError::Collision {
                target: target.clone(),
                with,
            };
            tracing::warn!(%source, %reason, "page skipped");
            emit(RenderEvent::PageSkipped {
                source: source.clone(),
                reason: reason.to_string(),
            });
            plan.skipped.push(SkippedPage { source, reason });
            continue;
        }

        plan.jobs.push(PageJob {
            source_path: content_root.join(&source),
            nav: NavigationContext {
                url_prefix: climb_prefix(&node.relative_path),
                active_target: target.clone(),
            },
            title: page_title(resolved.file),
            convert: map.is_source(resolved.file),
            source,
            target,
        });
    }

    for child in &node.children {
        plan_node(child, content_root, output_root, map, plan, emit)?;
    }
    Ok(())
}

/// Outer error: fatal. Inner error: this page is skipped.
fn render_page(
    job: &PageJob,
    root: &ContentNode,
    output_root: &Path,
    collaborators: Collaborators<'_>,
    map: &ExtensionMap,
) -> Result<Result<(), PageError>, RenderError> {
    let bytes = fs::read(&job.source_path).map_err(io_err(&job.source_path))?;

    let html = match compose(job, bytes, root, collaborators, map) {
        Ok(html) => html,
        Err(reason) => return Ok(Err(reason)),
    };

    let out_path = output_root.join(job.target.as_str());
    fs::write(&out_path, html).map_err(io_err(&out_path))?;
    tracing::debug!(source = %job.source, target = %job.target, "page written");
    Ok(Ok(()))
}

fn compose(
    job: &PageJob,
    bytes: Vec<u8>,
    root: &ContentNode,
    collaborators: Collaborators<'_>,
    map: &ExtensionMap,
) -> Result<String, PageError> {
    let text = convert::decode(bytes)?;
    let content = if job.convert {
        collaborators.converter.convert(&text)?
    } else {
        text
    };
    let page = PageContext {
        base_path: job.nav.url_prefix.clone(),
        title: job.title.clone(),
        navigation: render_nav(root, &job.nav, map).into_string(),
        content,
    };
    Ok(collaborators.layout.apply(&page)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MarkdownConverter;
    use crate::layout::TemplateLayout;
    use crate::test_helpers::*;
    use crate::tree::{self, AcceptedExtensions};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Converter that rejects any page containing `FAIL`.
    struct Picky;

    impl Converter for Picky {
        fn convert(&self, raw: &str) -> Result<String, ConversionError> {
            if raw.contains("FAIL") {
                Err(ConversionError::Rejected("page asked to fail".into()))
            } else {
                MarkdownConverter.convert(raw)
            }
        }
    }

    fn layout() -> TemplateLayout {
        TemplateLayout::parse("[{{ base_path }}|{{ title }}]{{ navigation }}{{ content }}").unwrap()
    }

    fn run(
        content: &TempDir,
        accepted: &AcceptedExtensions,
        converter: &dyn Converter,
        page_layout: &dyn Layout,
    ) -> (TempDir, RenderReport, Vec<RenderEvent>) {
        let root = tree::build(content.path(), accepted).unwrap();
        let out = TempDir::new().unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let report = render(
            &root,
            content.path(),
            out.path(),
            Collaborators {
                converter,
                layout: page_layout,
            },
            &RenderOptions::default(),
            Some(tx),
        )
        .unwrap();
        let events = rx.into_iter().collect();
        (out, report, events)
    }

    fn md() -> AcceptedExtensions {
        AcceptedExtensions::content_only("md")
    }

    #[test]
    fn output_mirrors_tree() {
        let content = content_dir(&["index.md", "Guide/a.md", "Guide/b.md", "Solo/only.md"]);
        fs::create_dir(content.path().join("Empty")).unwrap();
        let (out, report, _) = run(&content, &md(), &MarkdownConverter, &layout());

        for page in ["index.html", "Guide/a.html", "Guide/b.html", "Solo/only.html"] {
            assert!(out.path().join(page).is_file(), "missing {page}");
        }
        assert!(out.path().join("Empty").is_dir());
        assert_eq!(report.directories, 4);
        assert_eq!(report.written.len(), 4);
        assert!(report.is_clean());
    }

    #[test]
    fn written_pages_follow_tree_order() {
        let content = content_dir(&["z.md", "a.md", "B/x.md", "A/y.md"]);
        let (_out, report, _) = run(&content, &md(), &MarkdownConverter, &layout());

        let sources: Vec<&str> = report.written.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "z.md", "A/y.md", "B/x.md"]);
    }

    #[test]
    fn page_receives_prefix_title_nav_and_body() {
        let content = content_dir(&["index.md", "Guide/a.md", "Guide/b.md"]);
        let (out, _, _) = run(&content, &md(), &MarkdownConverter, &layout());

        let page = fs::read_to_string(out.path().join("Guide/a.html")).unwrap();
        assert!(page.starts_with("[../|a]"));
        assert!(page.contains(r#"<a href="../Guide/a.html" class="active">a</a>"#));
        assert!(page.contains(r#"href="../index.html""#));
        assert!(page.contains("<h1>a</h1>"));
        assert_eq!(active_count(&page), 1);
    }

    #[test]
    fn conversion_failure_skips_only_that_page() {
        let content = content_dir(&["a.md", "b.md", "c.md"]);
        fs::write(content.path().join("b.md"), "FAIL").unwrap();
        let (out, report, events) = run(&content, &md(), &Picky, &layout());

        assert!(out.path().join("a.html").is_file());
        assert!(!out.path().join("b.html").exists());
        assert!(out.path().join("c.html").is_file());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].source, "b.md");
        assert!(matches!(report.skipped[0].reason, PageError::Conversion(_)));
        assert!(events.iter().any(|e| matches!(
            e,
            RenderEvent::PageSkipped { source, .. } if source == "b.md"
        )));
    }

    #[test]
    fn non_utf8_source_is_conversion_error() {
        let content = content_dir(&["ok.md"]);
        fs::write(content.path().join("bad.md"), [0x23, 0x20, 0xff, 0xfe]).unwrap();
        let (_out, report, _) = run(&content, &md(), &MarkdownConverter, &layout());

        assert_eq!(report.written.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            PageError::Conversion(ConversionError::InvalidUtf8(2))
        );
    }

    #[test]
    fn templating_failure_is_reported_per_page() {
        let content = content_dir(&["a.md"]);
        let strict = TemplateLayout::parse("{{ author }}").unwrap();
        let (_out, report, _) = run(&content, &md(), &MarkdownConverter, &strict);

        assert!(report.written.is_empty());
        assert!(matches!(report.skipped[0].reason, PageError::Templating(_)));
    }

    #[test]
    fn passthrough_page_is_not_converted() {
        let content = content_dir(&["new.md"]);
        fs::write(content.path().join("old.htm"), "<p>*raw*</p>").unwrap();
        let accepted = AcceptedExtensions::with_passthrough("md", "htm");
        let (out, _, _) = run(&content, &accepted, &MarkdownConverter, &layout());

        let page = fs::read_to_string(out.path().join("old.htm")).unwrap();
        assert!(page.contains("<p>*raw*</p>"));
        assert!(page.contains(r#"<a href="old.htm" class="active">old</a>"#));
    }

    #[test]
    fn colliding_file_is_skipped_in_favour_of_first() {
        let content = content_dir(&["a.md"]);
        fs::write(content.path().join("a.html"), "<p>verbatim</p>").unwrap();
        let accepted = AcceptedExtensions::with_passthrough("md", "html");
        let (out, report, _) = run(&content, &accepted, &MarkdownConverter, &layout());

        // "a.html" sorts before "a.md" and claims the target.
        let page = fs::read_to_string(out.path().join("a.html")).unwrap();
        assert!(page.contains("<p>verbatim</p>"));
        assert_eq!(
            report.skipped,
            vec![SkippedPage {
                source: "a.md".to_string(),
                reason: PageError::Collision {
                    target: TargetPath::parse("a.html"),
                    with: "a.html".to_string(),
                },
            }]
        );
    }

    #[test]
    fn colliding_files_leave_one_active_link() {
        let content = content_dir(&["a.md", "b.md"]);
        fs::write(content.path().join("a.html"), "<p>verbatim</p>").unwrap();
        let accepted = AcceptedExtensions::with_passthrough("md", "html");
        let (out, report, _) = run(&content, &accepted, &MarkdownConverter, &layout());

        assert_eq!(report.skipped.len(), 1);
        for page in ["a.html", "b.html"] {
            let html = fs::read_to_string(out.path().join(page)).unwrap();
            assert_eq!(active_count(&html), 1, "in {page}");
            assert_eq!(html.matches(r#"href="a.html""#).count(), 1, "in {page}");
        }
    }

    #[test]
    fn file_shadowed_by_directory_is_skipped_not_fatal() {
        let content = content_dir(&["x.md", "x.html/y.md", "z.md"]);
        let (out, report, events) = run(&content, &md(), &MarkdownConverter, &layout());

        assert!(out.path().join("x.html").is_dir());
        assert!(out.path().join("x.html/y.html").is_file());
        assert!(out.path().join("z.html").is_file());
        assert_eq!(
            report.skipped,
            vec![SkippedPage {
                source: "x.md".to_string(),
                reason: PageError::Collision {
                    target: TargetPath::parse("x.html"),
                    with: "x.html/".to_string(),
                },
            }]
        );
        assert!(events.iter().any(|e| matches!(
            e,
            RenderEvent::PageSkipped { source, .. } if source == "x.md"
        )));
    }

    #[test]
    fn events_cover_every_directory_and_page() {
        let content = content_dir(&["index.md", "Guide/a.md"]);
        let (_out, _, events) = run(&content, &md(), &MarkdownConverter, &layout());

        let dirs: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::DirectoryEntered { relative_path, .. } => Some(relative_path.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(dirs, vec!["", "Guide"]);
        let mut pages: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::PageWritten { target, .. } => Some(target.as_str()),
                _ => None,
            })
            .collect();
        pages.sort();
        assert_eq!(pages, vec!["Guide/a.html", "index.html"]);
    }

    #[test]
    fn thread_count_does_not_change_output() {
        let content = content_dir(&["index.md", "A/x.md", "A/y.md", "B/C/z.md", "B/w.md"]);
        let root = tree::build(content.path(), &md()).unwrap();
        let template = layout();
        let collaborators = Collaborators {
            converter: &MarkdownConverter,
            layout: &template,
        };

        let mut outputs = Vec::new();
        for jobs in [Some(1), None] {
            let out = TempDir::new().unwrap();
            let options = RenderOptions {
                jobs,
                ..RenderOptions::default()
            };
            let report =
                render(&root, content.path(), out.path(), collaborators, &options, None).unwrap();
            let pages: Vec<String> = report
                .written
                .iter()
                .map(|p| fs::read_to_string(out.path().join(p.target.as_str())).unwrap())
                .collect();
            outputs.push((report, pages));
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn unreadable_output_root_is_fatal() {
        let content = content_dir(&["a.md"]);
        let root = tree::build(content.path(), &md()).unwrap();
        let blocker = TempDir::new().unwrap();
        let file_as_root = blocker.path().join("not-a-dir");
        fs::write(&file_as_root, "").unwrap();
        let template = layout();

        let result = render(
            &root,
            content.path(),
            &file_as_root,
            Collaborators {
                converter: &MarkdownConverter,
                layout: &template,
            },
            &RenderOptions::default(),
            None,
        );
        assert!(matches!(result, Err(RenderError::Io { .. })));
    }
}
