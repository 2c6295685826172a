//! Merging classified spans into ordered output sections.
//!
//! A paper with twelve headings might map onto four concepts. The merger
//! folds the spans of each concept together, in document order, and emits
//! concepts in vocabulary order:
//!
//! ```text
//! spans:    [A: reliability] [B: scalability] [C: reliability] [D: scalability]
//! vocab:    reliability, scalability, maintainability
//!
//! output:   0  reliability      A \n\n C    heading_count 2
//!           1  scalability      B \n\n D    heading_count 2
//!                                           (maintainability: no spans, omitted)
//! ```
//!
//! Sort orders are positions among the sections actually emitted, so they
//! are always `0..n` with no gaps.

use tracing::debug;

use crate::section::ConceptSection;
use crate::vocabulary::Vocabulary;

/// Separator between merged span contents.
pub const SPAN_SEPARATOR: &str = "\n\n";

/// A span with its concept decided.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSpan {
    /// Assigned concept.
    pub concept_id: String,
    /// Display title of the span.
    pub title: String,
    /// Span body.
    pub content: String,
    /// Classification confidence, if the span was classified at all.
    pub confidence: Option<f64>,
}

/// How classified spans become sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One section per concept, in vocabulary order.
    #[default]
    ByConcept,
    /// One section per span, in document order.
    PerSpan,
}

/// Builds the final section list for one resource.
///
/// ## Example
///
/// ```rust
/// use sectioner::{ClassifiedSpan, Merger, Vocabulary};
///
/// let span = |concept: &str, content: &str| ClassifiedSpan {
///     concept_id: concept.into(),
///     title: String::new(),
///     content: content.into(),
///     confidence: Some(1.0),
/// };
/// let spans = [span("scalability", "B"), span("reliability", "A"), span("scalability", "D")];
/// let sections = Merger::new("ddia-ch1").merge(&spans, &Vocabulary::ddia_chapter_one());
///
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[0].concept_id, "reliability");
/// assert_eq!(sections[1].content_original, "B\n\nD");
/// assert_eq!(sections[1].sort_order, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Merger {
    resource_id: String,
    layout: Layout,
}

impl Merger {
    /// A by-concept merger for `resource_id`.
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            layout: Layout::ByConcept,
        }
    }

    /// Choose the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Produce ordered sections.
    #[must_use]
    pub fn merge(&self, spans: &[ClassifiedSpan], vocabulary: &Vocabulary) -> Vec<ConceptSection> {
        let sections = match self.layout {
            Layout::ByConcept => self.by_concept(spans, vocabulary),
            Layout::PerSpan => self.per_span(spans),
        };
        debug!(spans = spans.len(), sections = sections.len(), layout = ?self.layout, "merged sections");
        sections
    }

    fn by_concept(&self, spans: &[ClassifiedSpan], vocabulary: &Vocabulary) -> Vec<ConceptSection> {
        let mut sections = Vec::new();
        for concept in vocabulary.concepts() {
            let members: Vec<&ClassifiedSpan> = spans.iter().filter(|s| s.concept_id == concept.id).collect();
            if members.is_empty() {
                continue;
            }
            let content = members
                .iter()
                .map(|s| s.content.as_str())
                .collect::<Vec<_>>()
                .join(SPAN_SEPARATOR);
            let section = ConceptSection::new(
                &self.resource_id,
                &concept.id,
                concept.display_title(),
                sections.len(),
                content,
                mean_confidence(&members),
            )
            .with_heading_count(members.len());
            sections.push(section);
        }
        sections
    }

    fn per_span(&self, spans: &[ClassifiedSpan]) -> Vec<ConceptSection> {
        spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                ConceptSection::new(
                    &self.resource_id,
                    &span.concept_id,
                    &span.title,
                    i,
                    &span.content,
                    span.confidence,
                )
            })
            .collect()
    }
}

/// Mean of the confidences present; `None` when no member has one.
fn mean_confidence(members: &[&ClassifiedSpan]) -> Option<f64> {
    let scores: Vec<f64> = members.iter().filter_map(|s| s.confidence).collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}
