//! The ConceptSection type: one ordered, classified unit of output.

use serde::{Deserialize, Serialize};

use crate::normalize::{char_count, word_count};

/// A labeled section of a resource, ready for translation and storage.
///
/// Every ingestion path (papers, template-driven chapters, transcripts)
/// produces this one shape, so downstream consumers see the same field names
/// regardless of source.
///
/// ## Size Metrics
///
/// `word_count` and `char_count` are always computed from
/// `content_original` at construction, so they cannot drift from the content:
///
/// ```rust
/// use sectioner::ConceptSection;
///
/// let section = ConceptSection::new("arxiv-2005.11401", "rag", "1. Introduction", 0, "Large models store facts.", Some(1.0));
/// assert_eq!(section.word_count, 4);
/// assert_eq!(section.char_count, 25);
/// ```
///
/// ## Confidence
///
/// `segmentation_confidence` is 1.0 for keyword and template matches, the
/// remote classifier's score for fallback classifications, and a low constant
/// for carried-forward spans. Transcript chunks are not classified and carry
/// no confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSection {
    /// The resource this section belongs to.
    pub resource_id: String,
    /// Concept id from the resource's closed vocabulary.
    pub concept_id: String,
    /// Human-readable section title.
    pub section_title: String,
    /// Zero-based position; contiguous within one resource.
    pub sort_order: usize,
    /// Section body as extracted.
    pub content_original: String,
    /// Whitespace-delimited words in `content_original`.
    pub word_count: usize,
    /// Characters in `content_original`.
    pub char_count: usize,
    /// Classification confidence in [0, 1], rounded to two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation_confidence: Option<f64>,
    /// Number of structural spans merged into this section.
    pub heading_count: usize,
}

impl ConceptSection {
    /// Create a section from a single span of content.
    #[must_use]
    pub fn new(
        resource_id: impl Into<String>,
        concept_id: impl Into<String>,
        section_title: impl Into<String>,
        sort_order: usize,
        content: impl Into<String>,
        confidence: Option<f64>,
    ) -> Self {
        let content_original = content.into();
        Self {
            resource_id: resource_id.into(),
            concept_id: concept_id.into(),
            section_title: section_title.into(),
            sort_order,
            word_count: word_count(&content_original),
            char_count: char_count(&content_original),
            content_original,
            segmentation_confidence: confidence.map(round2),
            heading_count: 1,
        }
    }

    /// Record how many spans were merged into this section.
    #[must_use]
    pub fn with_heading_count(mut self, heading_count: usize) -> Self {
        self.heading_count = heading_count;
        self
    }
}

/// Round to two decimals, clamped to [0, 1].
pub(crate) fn round2(x: f64) -> f64 {
    ((x.clamp(0.0, 1.0)) * 100.0).round() / 100.0
}

impl std::fmt::Display for ConceptSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {} words",
            self.sort_order, self.section_title, self.concept_id, self.word_count
        )?;
        if let Some(confidence) = self.segmentation_confidence {
            write!(f, ", confidence={confidence}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_track_content() {
        let s = ConceptSection::new("r", "c", "T", 0, "uno dos\n\ntres ñ", None);
        assert_eq!(s.word_count, 4);
        assert_eq!(s.char_count, 15);
        assert_eq!(s.heading_count, 1);
    }

    #[test]
    fn test_confidence_rounded_and_clamped() {
        let s = ConceptSection::new("r", "c", "T", 0, "x", Some(0.876));
        assert_eq!(s.segmentation_confidence, Some(0.88));
        let s = ConceptSection::new("r", "c", "T", 0, "x", Some(1.7));
        assert_eq!(s.segmentation_confidence, Some(1.0));
    }

    #[test]
    fn test_serialized_field_names() {
        let s = ConceptSection::new("youtube-abc", "to-be-mapped", "Part 1 (0:00 - 1:00)", 0, "hi", None);
        let json = serde_json::to_value(&s).unwrap();
        for key in [
            "resource_id",
            "concept_id",
            "section_title",
            "sort_order",
            "content_original",
            "word_count",
            "char_count",
            "heading_count",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("segmentation_confidence").is_none());
    }

    #[test]
    fn test_display() {
        let s = ConceptSection::new("r", "scalability", "Scalability", 2, "a b c", Some(1.0));
        assert_eq!(s.to_string(), "[2] Scalability (scalability): 3 words, confidence=1");
    }
}
