//! Heading detection for extracted research papers.
//!
//! ## The Problem
//!
//! Markdown produced from a PDF has no reliable heading markup. The same
//! heading shows up in several shapes, depending on the extractor's mood:
//!
//! ```text
//! **1** **Introduction**
//! **1 Introduction**
//! ## 1 Introduction
//! ## **1** **Introduction**
//! **Abstract**
//! ```
//!
//! while a line of prose such as "1 Introduction of the method is..." must not
//! be mistaken for one.
//!
//! ## The Cascade
//!
//! 1. Reject empty lines.
//! 2. Reject lines that are not visibly emphasized: a heading starts with `#`,
//!    or starts with `**` and carries at least two `**` delimiters.
//! 3. Strip markers and collapse whitespace to get the title candidate.
//! 4. Numbered: `<digits>[.][digits][.] <title>`.
//! 5. Unnumbered: the whole candidate is a known section name.
//!
//! Steps 4 and 5 are mutually exclusive pattern variants, so the result is a
//! tagged [`HeadingMatch`] rather than a tuple with sentinel values.
//!
//! Skip sections (references, appendices, acknowledgments, ethics statements)
//! are detected like any other heading so they still close the section
//! before them; [`HeadingCandidate::skip`] marks them for exclusion.

use std::sync::LazyLock;

use regex::Regex;

/// Every section name recognized without a number, skip sections included.
const KNOWN_SECTIONS: &str = "Abstract|Introduction|Related Work|Background|\
    Methodology|Method|Methods|Approach|\
    Model|Architecture|Framework|System|\
    Experiments?|Results?|Evaluation|Analysis|Discussion|\
    Conclusion|Conclusions|Summary|\
    Limitations|Future Work|Broader Impact|\
    Acknowledgments?|Acknowledgements?|\
    References|Bibliography|\
    Appendix|Appendices|Supplementary|\
    Broader Impact Statement|Ethics Statement";

static RE_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*\.?)\s+(.+)$").expect("valid numbered heading regex"));
static RE_UNNUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(?:{KNOWN_SECTIONS})$")).expect("valid unnumbered heading regex")
});
static RE_SKIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:References|Bibliography|Appendix|Appendices|Supplementary|Acknowledgments?|Acknowledgements?|Broader Impact Statement|Ethics Statement)$",
    )
    .expect("valid skip section regex")
});
static RE_HEADING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,3}\s*").expect("valid heading prefix regex"));

/// Outcome of testing one line for heading shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingMatch {
    /// Ordinary text.
    NotAHeading,
    /// `"3.1 Models"` -> number `"3.1"`, title `"Models"`.
    Numbered {
        /// Section number with any trailing period removed.
        number: String,
        /// Heading text after the number.
        title: String,
    },
    /// A known section name such as `"Abstract"`.
    Unnumbered {
        /// The heading text as written.
        title: String,
    },
}

impl HeadingMatch {
    /// Match the pattern cascade against an already-normalized title line.
    ///
    /// No emphasis check happens here; see [`detect_heading`] for raw lines.
    ///
    /// ```rust
    /// use sectioner::HeadingMatch;
    ///
    /// assert_eq!(
    ///     HeadingMatch::parse("1 Introduction"),
    ///     HeadingMatch::Numbered { number: "1".into(), title: "Introduction".into() }
    /// );
    /// assert_eq!(
    ///     HeadingMatch::parse("abstract"),
    ///     HeadingMatch::Unnumbered { title: "abstract".into() }
    /// );
    /// ```
    #[must_use]
    pub fn parse(normalized: &str) -> Self {
        if normalized.is_empty() {
            return Self::NotAHeading;
        }
        if let Some(caps) = RE_NUMBERED.captures(normalized) {
            return Self::Numbered {
                number: caps[1].trim_end_matches('.').to_string(),
                title: caps[2].trim().to_string(),
            };
        }
        if RE_UNNUMBERED.is_match(normalized) {
            return Self::Unnumbered {
                title: normalized.trim().to_string(),
            };
        }
        Self::NotAHeading
    }

    /// The heading title, if this is a heading.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::NotAHeading => None,
            Self::Numbered { title, .. } | Self::Unnumbered { title } => Some(title),
        }
    }

    /// The section number, if the heading carries one.
    #[must_use]
    pub fn number(&self) -> Option<&str> {
        match self {
            Self::Numbered { number, .. } => Some(number),
            _ => None,
        }
    }

    /// Unnumbered, or numbered with a bare integer (`"2"`, not `"2.1"`).
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        match self {
            Self::NotAHeading => false,
            Self::Unnumbered { .. } => true,
            Self::Numbered { number, .. } => is_bare_integer(number),
        }
    }
}

fn is_bare_integer(number: &str) -> bool {
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

/// A heading found at a specific line of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate {
    /// Zero-based line index.
    pub line: usize,
    /// Section number, when numbered.
    pub number: Option<String>,
    /// Normalized heading title.
    pub title: String,
    /// References, appendices and the like: a boundary, never output.
    pub skip: bool,
}

impl HeadingCandidate {
    /// Unnumbered, or numbered with a bare integer.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.number.as_deref().map_or(true, is_bare_integer)
    }
}

/// Whether a title names a section that is excluded from output.
#[must_use]
pub fn is_skip_title(title: &str) -> bool {
    RE_SKIP.is_match(title.trim())
}

/// Whether a line is visually emphasized enough to be a heading.
fn is_emphasized(line: &str) -> bool {
    line.starts_with('#') || (line.starts_with("**") && line.matches("**").count() >= 2)
}

/// Strip heading prefixes and bold markers, collapse whitespace.
///
/// ```rust
/// use sectioner::strip_emphasis;
///
/// assert_eq!(strip_emphasis("## **1** **Introduction**"), "1 Introduction");
/// assert_eq!(strip_emphasis("**Abstract**"), "Abstract");
/// ```
#[must_use]
pub fn strip_emphasis(line: &str) -> String {
    let without_prefix = RE_HEADING_PREFIX.replace(line.trim(), "");
    without_prefix
        .replace("**", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify one raw document line.
///
/// ```rust
/// use sectioner::{detect_heading, HeadingMatch};
///
/// assert_eq!(
///     detect_heading("**Abstract**"),
///     HeadingMatch::Unnumbered { title: "Abstract".into() }
/// );
/// assert_eq!(detect_heading("The system achieves 3x throughput."), HeadingMatch::NotAHeading);
/// ```
#[must_use]
pub fn detect_heading(line: &str) -> HeadingMatch {
    let stripped = line.trim();
    if stripped.is_empty() || !is_emphasized(stripped) {
        return HeadingMatch::NotAHeading;
    }
    HeadingMatch::parse(&strip_emphasis(stripped))
}

/// Scan every line and collect the headings in document order.
#[must_use]
pub fn detect_headings(lines: &[&str]) -> Vec<HeadingCandidate> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line, raw)| {
            let found = detect_heading(raw);
            let title = found.title()?.to_string();
            Some(HeadingCandidate {
                line,
                number: found.number().map(str::to_string),
                skip: is_skip_title(&title),
                title,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(number: &str, title: &str) -> HeadingMatch {
        HeadingMatch::Numbered {
            number: number.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_numbered_shapes() {
        assert_eq!(detect_heading("**1** **Introduction**"), numbered("1", "Introduction"));
        assert_eq!(detect_heading("**1 Introduction**"), numbered("1", "Introduction"));
        assert_eq!(detect_heading("## 1 Introduction"), numbered("1", "Introduction"));
        assert_eq!(detect_heading("## **2.** **Related Work**"), numbered("2", "Related Work"));
    }

    #[test]
    fn test_sub_numbered_is_not_top_level() {
        let found = detect_heading("### 3.2 Related Metrics");
        assert_eq!(found, numbered("3.2", "Related Metrics"));
        assert!(!found.is_top_level());
        assert!(HeadingMatch::parse("1 Introduction").is_top_level());
    }

    #[test]
    fn test_unnumbered_known_names() {
        assert_eq!(
            detect_heading("**Abstract**"),
            HeadingMatch::Unnumbered { title: "Abstract".into() }
        );
        assert_eq!(
            detect_heading("## related work"),
            HeadingMatch::Unnumbered { title: "related work".into() }
        );
        assert_eq!(detect_heading("**Our Secret Sauce**"), HeadingMatch::NotAHeading);
    }

    #[test]
    fn test_plain_prose_rejected() {
        assert_eq!(detect_heading("1 Introduction"), HeadingMatch::NotAHeading);
        assert_eq!(
            detect_heading("The system achieves state of the art results."),
            HeadingMatch::NotAHeading
        );
        assert_eq!(detect_heading("   "), HeadingMatch::NotAHeading);
        assert_eq!(detect_heading("**"), HeadingMatch::NotAHeading);
    }

    #[test]
    fn test_skip_titles() {
        assert!(is_skip_title("References"));
        assert!(is_skip_title("acknowledgements"));
        assert!(is_skip_title("Ethics Statement"));
        assert!(!is_skip_title("Results"));
    }

    #[test]
    fn test_detect_headings_marks_skip_and_lines() {
        let lines = ["**Abstract**", "text", "**6** **References**", "**A.1 Proofs**"];
        let found = detect_headings(&lines);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, 0);
        assert!(!found[0].skip);
        assert_eq!(found[1].line, 2);
        assert_eq!(found[1].number.as_deref(), Some("6"));
        assert!(found[1].skip);
        assert!(found[1].is_top_level());
    }
}
