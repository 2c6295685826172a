//! Artifact stripping for extracted documents and caption text.
//!
//! PDF-to-markdown extraction leaves presentation debris in the text stream:
//!
//! ```text
//! **8** **|** **Chapter 1: Reliable, Scalable, and Maintainable Applications**
//! Reliability | 7
//! 12
//! arXiv:2005.11401v4 [cs.CL] 12 Apr 2021
//! ```
//!
//! None of these lines carry content, and some of them (bold page footers)
//! look enough like headings to confuse the heading detector. They are removed
//! line by line; everything else is left exactly as extracted, including
//! emphasis markup, which the heading detector needs.
//!
//! Auto-generated captions have a different kind of noise: bracketed
//! non-speech markers (`[Music]`, `[Applause]`) and recognizer stutter
//! ("the the the the solution"). [`normalize_transcript`] removes both.
//!
//! Every function here is pure and idempotent: normalizing already-normalized
//! text returns it unchanged.

use std::sync::LazyLock;

use regex::Regex;

/// Consecutive repeats of one word kept before the rest are dropped.
pub const MAX_STUTTER_REPEAT: usize = 3;

/// Blank lines kept in a row; longer runs are truncated to this.
const MAX_BLANK_RUN: usize = 2;

static RE_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*{0,2}\d+\*{0,2}$").expect("valid page number regex"));
static RE_RUNNING_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.{0,60}\|\s*\d+\s*$").expect("valid running header regex"));
static RE_ARXIV_STAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^arXiv:\d{4}\.\d{4,5}").expect("valid arxiv stamp regex"));
static RE_BOLD_FOOTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*\d+\*\*\s*\*\*\|\*\*|^\*\*\w+\*\*\s*\*\*\|\*\*\s*\*\*\d+\*\*")
        .expect("valid bold footer regex")
});
static RE_CHAPTER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*Chapter \d+:.*\*\*$").expect("valid chapter header regex"));
static RE_CAPTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\s*(?:music|applause|laughter|silence|background\s+noise|inaudible)\s*\]")
        .expect("valid caption marker regex")
});

/// Whether a (trimmed) line is a page number, running header, or footer.
fn is_page_artifact(line: &str) -> bool {
    RE_PAGE_NUMBER.is_match(line)
        || RE_RUNNING_HEADER.is_match(line)
        || RE_ARXIV_STAMP.is_match(line)
        || RE_BOLD_FOOTER.is_match(line)
        || RE_CHAPTER_HEADER.is_match(line)
}

/// Remove page artifacts from extracted document text.
///
/// Drops standalone page numbers, `Title | N` running headers, bold page
/// footers, repeated chapter headers, and arXiv identifier stamps, then
/// truncates runs of blank lines to two. Paragraph boundaries survive.
///
/// ```rust
/// use sectioner::clean_page_artifacts;
///
/// let raw = "Intro text.\n12\nReliability | 7\nMore text.";
/// assert_eq!(clean_page_artifacts(raw), "Intro text.\nMore text.");
/// ```
#[must_use]
pub fn clean_page_artifacts(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut blank_run = 0usize;

    for line in text.split('\n') {
        let stripped = line.trim();
        if stripped.is_empty() {
            blank_run += 1;
            if blank_run <= MAX_BLANK_RUN {
                kept.push(line);
            }
            continue;
        }
        if is_page_artifact(stripped) {
            continue;
        }
        blank_run = 0;
        kept.push(line);
    }

    kept.join("\n")
}

/// Remove bracketed non-speech markers from caption text.
///
/// The result is trimmed; a fragment that was nothing but markers becomes
/// the empty string.
#[must_use]
pub fn strip_caption_markers(text: &str) -> String {
    let mut current = text.to_string();
    // Removing one marker can splice the halves of another together.
    loop {
        let next = RE_CAPTION_MARKER.replace_all(&current, "");
        if next == current {
            break;
        }
        current = next.into_owned();
    }
    current.trim().to_string()
}

/// Truncate runs of the same word (case-insensitive) to `max_repeat`.
///
/// ```rust
/// use sectioner::dedupe_stutter;
///
/// let words = ["the", "the", "The", "the", "solution"];
/// assert_eq!(dedupe_stutter(&words, 3), ["the", "the", "The", "solution"]);
/// ```
#[must_use]
pub fn dedupe_stutter<'a>(words: &[&'a str], max_repeat: usize) -> Vec<&'a str> {
    let mut out: Vec<&'a str> = Vec::with_capacity(words.len());
    let mut previous: Option<String> = None;
    let mut repeat = 0usize;

    for &word in words {
        let folded = word.to_lowercase();
        if previous.as_deref() == Some(folded.as_str()) {
            repeat += 1;
        } else {
            repeat = 1;
            previous = Some(folded);
        }
        if repeat <= max_repeat {
            out.push(word);
        }
    }

    out
}

/// Normalize joined caption text: markers out, stutter capped, whitespace
/// collapsed to single spaces.
#[must_use]
pub fn normalize_transcript(text: &str) -> String {
    // Collapse first so markers split across line breaks are still caught.
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = strip_caption_markers(&collapsed);
    let words: Vec<&str> = stripped.split_whitespace().collect();
    dedupe_stutter(&words, MAX_STUTTER_REPEAT).join(" ")
}

/// Whitespace-delimited word count, the unit every size metric uses.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Character (Unicode scalar) count.
#[must_use]
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}
