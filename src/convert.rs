//! Markdown → HTML conversion.

use pulldown_cmark::{Options, Parser, html as md_html};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("source is not valid UTF-8 (byte offset {0})")]
    InvalidUtf8(usize),
    #[error("{0}")]
    Rejected(String),
}

/// Turns raw page text into an HTML fragment.
pub trait Converter: Send + Sync {
    fn convert(&self, raw: &str) -> Result<String, ConversionError>;
}

/// GitHub-flavoured markdown via pulldown-cmark: tables, strikethrough,
/// task lists and footnotes on top of CommonMark.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES
    }
}

impl Converter for MarkdownConverter {
    fn convert(&self, raw: &str) -> Result<String, ConversionError> {
        let parser = Parser::new_ext(raw, Self::options());
        let mut html = String::with_capacity(raw.len() * 3 / 2);
        md_html::push_html(&mut html, parser);
        Ok(html)
    }
}

/// Decode source bytes as UTF-8 text.
pub fn decode(bytes: Vec<u8>) -> Result<String, ConversionError> {
    String::from_utf8(bytes).map_err(|e| ConversionError::InvalidUtf8(e.utf8_error().valid_up_to()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_emphasis() {
        let html = MarkdownConverter
            .convert("This is **bold** and *italic*.")
            .unwrap();
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
    }

    #[test]
    fn converts_tables() {
        let html = MarkdownConverter
            .convert("| a | b |\n|---|---|\n| 1 | 2 |\n")
            .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn converts_strikethrough_and_tasks() {
        let html = MarkdownConverter
            .convert("~~gone~~\n\n- [x] done\n")
            .unwrap();
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn decode_reports_offset() {
        assert_eq!(decode(b"ok".to_vec()).unwrap(), "ok");
        assert_eq!(
            decode(vec![b'a', b'b', 0xff]),
            Err(ConversionError::InvalidUtf8(2))
        );
    }
}
