//! Template-driven boundaries for documents with a known table of contents.
//!
//! Book chapters do not need fuzzy heading detection: the table of contents
//! already says which headings exist and which concept each one opens. A
//! [`ChapterTemplate`] lists those headings as exact patterns, in reading
//! order, each tagged with the concept it belongs to:
//!
//! ```text
//! "Thinking About Data Systems"  -> folded into "reliability"
//! "^Reliability$"                -> reliability
//! "^Scalability$"                -> scalability
//! "^Maintainability$"            -> maintainability
//! "^Summary$"                    -> chapter-summary
//! ```
//!
//! Boundary finding is the same cut-at-the-next-heading algorithm as
//! [`Segmenter`](crate::Segmenter), with exact patterns in place of the
//! heading detector. A pattern that never matches is a warning: the chapter
//! is still sectioned with whatever boundaries were found. Text before the
//! first boundary belongs to no section.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::heading::strip_emphasis;
use crate::vocabulary::{Concept, Vocabulary};
use crate::{Error, Result, Warning};

/// One expected heading in a chapter template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSection {
    /// Concept this heading opens.
    pub concept_id: String,
    /// Canonical title for the concept's merged section.
    pub title: String,
    /// Regex matched case-insensitively at the start of the bold-stripped line.
    pub heading_pattern: String,
    /// Fold this heading's content into another concept instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_in: Option<String>,
    /// Use the heading only as a boundary; drop its content.
    #[serde(default)]
    pub skip: bool,
}

impl TemplateSection {
    /// A heading that opens its own concept.
    pub fn new(
        concept_id: impl Into<String>,
        title: impl Into<String>,
        heading_pattern: impl Into<String>,
    ) -> Self {
        Self {
            concept_id: concept_id.into(),
            title: title.into(),
            heading_pattern: heading_pattern.into(),
            include_in: None,
            skip: false,
        }
    }

    /// Fold this heading's content into `concept_id`.
    #[must_use]
    pub fn include_in(mut self, concept_id: impl Into<String>) -> Self {
        self.include_in = Some(concept_id.into());
        self
    }

    /// Keep the boundary, drop the content.
    #[must_use]
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// The concept that receives this heading's content.
    #[must_use]
    pub fn target(&self) -> &str {
        self.include_in.as_deref().unwrap_or(&self.concept_id)
    }
}

/// The expected headings of one chapter, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTemplate {
    /// Chapter title, informational.
    #[serde(default)]
    pub title: String,
    /// Expected headings.
    pub sections: Vec<TemplateSection>,
}

impl ChapterTemplate {
    /// A template from its sections.
    pub fn new(title: impl Into<String>, sections: Vec<TemplateSection>) -> Self {
        Self {
            title: title.into(),
            sections,
        }
    }

    /// Compile the heading patterns.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPattern`] when a pattern is not a valid regex, and
    /// [`Error::EmptyVocabulary`] when every section is skipped.
    pub fn compile(&self) -> Result<TemplateSegmenter> {
        let mut patterns = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let source = format!("^(?:{})", section.heading_pattern);
            let regex = RegexBuilder::new(&source)
                .case_insensitive(true)
                .build()
                .map_err(|source| Error::InvalidPattern {
                    pattern: section.heading_pattern.clone(),
                    source,
                })?;
            patterns.push(regex);
        }
        Ok(TemplateSegmenter {
            sections: self.sections.clone(),
            patterns,
            vocabulary: self.target_vocabulary()?,
        })
    }

    /// Target concepts in first-appearance order, titled canonically.
    fn target_vocabulary(&self) -> Result<Vocabulary> {
        let mut concepts: Vec<Concept> = Vec::new();
        for section in self.sections.iter().filter(|s| !s.skip) {
            let target = section.target();
            if concepts.iter().any(|c| c.id == target) {
                continue;
            }
            let title = self
                .sections
                .iter()
                .find(|s| s.concept_id == target)
                .unwrap_or(section)
                .title
                .clone();
            concepts.push(Concept::new(target, Vec::<String>::new()).with_title(title));
        }
        Vocabulary::new(concepts)
    }

    /// DDIA chapter 1, "Reliable, Scalable, and Maintainable Applications".
    #[must_use]
    pub fn ddia_chapter_one() -> Self {
        Self::new(
            "Reliable, Scalable, and Maintainable Applications",
            vec![
                TemplateSection::new(
                    "thinking-about-data-systems",
                    "Thinking About Data Systems",
                    "Thinking About Data Systems",
                )
                .include_in("reliability"),
                TemplateSection::new("reliability", "Reliability", "Reliability$"),
                TemplateSection::new("scalability", "Scalability", "Scalability$"),
                TemplateSection::new("maintainability", "Maintainability", "Maintainability$"),
                TemplateSection::new("chapter-summary", "Summary", "Summary$"),
            ],
        )
    }
}

/// A boundary located in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSpan {
    /// Concept receiving this content (after `include_in`).
    pub concept_id: String,
    /// Title of the template section that matched.
    pub title: String,
    /// Heading line.
    pub start_line: usize,
    /// One past the last line.
    pub end_line: usize,
    /// The span's lines, trimmed.
    pub content: String,
}

/// Located spans plus missing-boundary warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSegmentation {
    /// Non-skipped spans in document order.
    pub spans: Vec<TemplateSpan>,
    /// One [`Warning::BoundaryNotFound`] per pattern that never matched.
    pub warnings: Vec<Warning>,
}

/// A compiled [`ChapterTemplate`].
#[derive(Debug, Clone)]
pub struct TemplateSegmenter {
    sections: Vec<TemplateSection>,
    patterns: Vec<Regex>,
    vocabulary: Vocabulary,
}

impl TemplateSegmenter {
    /// The concepts this template can produce, in output order.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Locate every expected heading and cut the text at them.
    #[must_use]
    pub fn segment(&self, text: &str) -> TemplateSegmentation {
        let lines: Vec<&str> = text.split('\n').collect();
        let cleaned: Vec<String> = lines.iter().map(|l| strip_emphasis(l)).collect();

        let mut warnings = Vec::new();
        let mut found: Vec<(usize, &TemplateSection)> = Vec::new();
        for (section, pattern) in self.sections.iter().zip(&self.patterns) {
            match cleaned.iter().position(|line| pattern.is_match(line)) {
                Some(line) => found.push((line, section)),
                None => {
                    warn!(pattern = %section.heading_pattern, "expected heading not found");
                    warnings.push(Warning::BoundaryNotFound {
                        pattern: section.heading_pattern.clone(),
                    });
                }
            }
        }
        found.sort_by_key(|(line, _)| *line);
        debug!(boundaries = found.len(), "located template boundaries");

        let mut spans = Vec::new();
        for (i, (start_line, section)) in found.iter().enumerate() {
            let end_line = found.get(i + 1).map_or(lines.len(), |(next, _)| *next);
            if section.skip {
                continue;
            }
            let content = lines[*start_line..end_line].join("\n").trim().to_string();
            // Two patterns on one heading leave the earlier one nothing.
            if content.is_empty() {
                debug!(title = %section.title, line = start_line, "dropping empty template span");
                continue;
            }
            spans.push(TemplateSpan {
                concept_id: section.target().to_string(),
                title: section.title.clone(),
                start_line: *start_line,
                end_line,
                content,
            });
        }

        TemplateSegmentation { spans, warnings }
    }
}
