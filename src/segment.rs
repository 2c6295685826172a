//! Structural segmentation: cutting a document into heading spans.
//!
//! ## The Algorithm
//!
//! ```text
//! line  0  **Abstract**               <- top-level      span 0: [0, 4)
//! line  4  ## 1 Introduction          <- top-level      span 1: [4, 9)
//! line  6  ### 1.1 Motivation         <- nested, stays inside span 1
//! line  9  **2** **Method**           <- top-level      span 2: [9, 20)
//! line 20  ## References              <- top-level skip: closes span 2, dropped
//! line 31  **Appendix**               <- top-level skip: dropped through end
//! ```
//!
//! Only top-level headings (unnumbered, or a bare integer) open spans. Each
//! span runs to the next top-level heading, skip headings included, or to
//! the end of the document. Nested headings remain body text.
//!
//! Spans under `min_words` words are dropped silently: a bold figure caption
//! that happens to read "**Results**" should not become a section.
//!
//! ## Degraded Mode
//!
//! When a document has no top-level headings at all, or every span was
//! skipped or too short, the whole document becomes a single fallback span.
//! That is logged and reported as a [`Warning`], never an error. Skip content
//! stays out of the fallback; if nothing else is left, there is no span.

use tracing::{debug, warn};

use crate::heading::{detect_headings, HeadingCandidate};
use crate::normalize::word_count;
use crate::Warning;

/// Spans below this many words are treated as extraction artifacts.
pub const DEFAULT_MIN_SPAN_WORDS: usize = 20;

/// Title of the single span produced in degraded mode.
pub const DEFAULT_FALLBACK_TITLE: &str = "Full Document";

/// A contiguous run of lines attributed to one top-level heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralSpan {
    /// First line (the heading line itself).
    pub start_line: usize,
    /// One past the last line.
    pub end_line: usize,
    /// Heading title without its number.
    pub title: String,
    /// Section number, when the heading was numbered.
    pub number: Option<String>,
    /// The span's lines, trimmed.
    pub content: String,
}

impl StructuralSpan {
    /// `"2. Method"` for numbered spans, the bare title otherwise.
    #[must_use]
    pub fn display_title(&self) -> String {
        match &self.number {
            Some(number) => format!("{number}. {}", self.title),
            None => self.title.clone(),
        }
    }

    /// Words in the span's content.
    #[must_use]
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }
}

/// Spans plus whatever went wrong finding them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    /// Spans in document order.
    pub spans: Vec<StructuralSpan>,
    /// Degraded-mode signals.
    pub warnings: Vec<Warning>,
}

/// Heading-driven segmenter for papers.
///
/// ## Example
///
/// ```rust
/// use sectioner::Segmenter;
///
/// let filler = "word ".repeat(30);
/// let text = format!("**Abstract**\n{filler}\n## 1 Introduction\n{filler}\n## References\n[1] A. Author.");
/// let seg = Segmenter::new().segment(&text);
///
/// assert_eq!(seg.spans.len(), 2);
/// assert_eq!(seg.spans[1].display_title(), "1. Introduction");
/// assert!(seg.warnings.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Segmenter {
    min_words: usize,
    fallback_title: String,
}

impl Segmenter {
    /// A segmenter with the default 20-word artifact threshold.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_words: DEFAULT_MIN_SPAN_WORDS,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }

    /// Change the minimum words a span needs to survive.
    #[must_use]
    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    /// Change the title of the degraded-mode span.
    #[must_use]
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }

    /// Segment normalized document text.
    #[must_use]
    pub fn segment(&self, text: &str) -> Segmentation {
        if text.trim().is_empty() {
            return Segmentation::default();
        }

        let lines: Vec<&str> = text.split('\n').collect();
        let headings = detect_headings(&lines);
        let top_level: Vec<&HeadingCandidate> =
            headings.iter().filter(|h| h.is_top_level()).collect();
        debug!(
            headings = headings.len(),
            top_level = top_level.len(),
            "detected headings"
        );

        if top_level.is_empty() {
            warn!("no section headings detected; treating the whole document as one section");
            return Segmentation {
                spans: vec![self.fallback_span(text.trim(), lines.len())],
                warnings: vec![Warning::NoHeadings],
            };
        }

        let mut spans = Vec::new();
        let mut skipped: Vec<(usize, usize)> = Vec::new();

        for (i, heading) in top_level.iter().enumerate() {
            let start_line = heading.line;
            let end_line = top_level.get(i + 1).map_or(lines.len(), |next| next.line);

            if heading.skip {
                debug!(title = %heading.title, "skipping excluded section");
                skipped.push((start_line, end_line));
                continue;
            }

            let content = lines[start_line..end_line].join("\n").trim().to_string();
            let words = word_count(&content);
            if words < self.min_words {
                debug!(title = %heading.title, words, "dropping short span");
                continue;
            }

            spans.push(StructuralSpan {
                start_line,
                end_line,
                title: heading.title.clone(),
                number: heading.number.clone(),
                content,
            });
        }

        if spans.is_empty() {
            warn!("every detected section was filtered out; using the full text");
            let kept: Vec<&str> = lines
                .iter()
                .enumerate()
                .filter(|(n, _)| !skipped.iter().any(|&(s, e)| (s..e).contains(n)))
                .map(|(_, line)| *line)
                .collect();
            let body = kept.join("\n");
            let spans = if body.trim().is_empty() {
                Vec::new()
            } else {
                vec![self.fallback_span(body.trim(), lines.len())]
            };
            return Segmentation {
                spans,
                warnings: vec![Warning::AllSpansFiltered],
            };
        }

        debug!(spans = spans.len(), "segmented document");
        Segmentation {
            spans,
            warnings: Vec::new(),
        }
    }

    fn fallback_span(&self, content: &str, line_count: usize) -> StructuralSpan {
        StructuralSpan {
            start_line: 0,
            end_line: line_count,
            title: self.fallback_title.clone(),
            number: None,
            content: content.to_string(),
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    #[test]
    fn test_nested_headings_fold_into_parent() {
        let text = format!(
            "## 1 Introduction\n{}\n### 1.1 Motivation\n{}\n## 2 Method\n{}",
            filler(10),
            filler(15),
            filler(25)
        );
        let seg = Segmenter::new().segment(&text);
        assert_eq!(seg.spans.len(), 2);
        assert!(seg.spans[0].content.contains("### 1.1 Motivation"));
        assert_eq!(seg.spans[0].start_line, 0);
        assert_eq!(seg.spans[0].end_line, 4);
        assert_eq!(seg.spans[1].start_line, 4);
        assert_eq!(seg.spans[1].end_line, 6);
    }

    #[test]
    fn test_skip_heading_closes_previous_span() {
        let text = format!(
            "**Abstract**\n{}\n**References**\n{}\n**Appendix**\n{}",
            filler(30),
            filler(40),
            filler(40)
        );
        let seg = Segmenter::new().segment(&text);
        assert_eq!(seg.spans.len(), 1);
        assert_eq!(seg.spans[0].title, "Abstract");
        assert_eq!(seg.spans[0].end_line, 2);
        assert!(seg.warnings.is_empty());
    }

    #[test]
    fn test_short_spans_dropped() {
        let text = format!("**Results**\nsee figure\n**Discussion**\n{}", filler(25));
        let seg = Segmenter::new().segment(&text);
        assert_eq!(seg.spans.len(), 1);
        assert_eq!(seg.spans[0].title, "Discussion");
    }

    #[test]
    fn test_no_headings_falls_back() {
        let text = "\nJust prose.\nMore prose.\n";
        let seg = Segmenter::new().segment(text);
        assert_eq!(seg.spans.len(), 1);
        assert_eq!(seg.spans[0].content, "Just prose.\nMore prose.");
        assert_eq!(seg.spans[0].title, DEFAULT_FALLBACK_TITLE);
        assert_eq!(seg.warnings, vec![Warning::NoHeadings]);
    }

    #[test]
    fn test_all_filtered_fallback_excludes_skip_content() {
        let text = "Preamble words.\n**Abstract**\nshort.\n**References**\n[1] Cited work.";
        let seg = Segmenter::new().with_fallback_title("Full Paper").segment(text);
        assert_eq!(seg.warnings, vec![Warning::AllSpansFiltered]);
        assert_eq!(seg.spans.len(), 1);
        assert_eq!(seg.spans[0].title, "Full Paper");
        assert!(seg.spans[0].content.contains("short."));
        assert!(!seg.spans[0].content.contains("Cited work"));
    }

    #[test]
    fn test_only_skip_content_yields_no_span() {
        let seg = Segmenter::new().segment("**References**\n[1] Cited work.");
        assert!(seg.spans.is_empty());
        assert_eq!(seg.warnings, vec![Warning::AllSpansFiltered]);
    }

    #[test]
    fn test_empty_text() {
        let seg = Segmenter::new().segment("  \n ");
        assert!(seg.spans.is_empty());
        assert!(seg.warnings.is_empty());
    }

    #[test]
    fn test_min_words_override() {
        let text = "**Abstract**\nthree short words";
        let seg = Segmenter::new().with_min_words(1).segment(text);
        assert_eq!(seg.spans.len(), 1);
        assert!(seg.warnings.is_empty());
    }
}
