//! End-to-end pipelines and the warnings they report.
//!
//! Three entry points, one output shape:
//!
//! | Pipeline | Input | Stages |
//! |----------|-------|--------|
//! | [`DocumentPipeline`] | extracted paper text | clean, detect headings, segment, classify, merge |
//! | [`TemplatePipeline`] | extracted chapter text | clean, locate template headings, merge |
//! | [`TranscriptPipeline`] | timed captions | clean, chunk |
//!
//! Each returns a [`Report`]: the ordered [`ConceptSection`]s plus every
//! recoverable problem met on the way. Warnings are also logged as they
//! happen; the report is for callers that want to act on them.

use std::fmt;

use tracing::info;

use crate::classify::{BatchSettings, ConceptClassifier};
use crate::merge::{ClassifiedSpan, Layout, Merger};
use crate::normalize::clean_page_artifacts;
use crate::remote::RemoteClassifier;
use crate::section::ConceptSection;
use crate::segment::Segmenter;
use crate::template::{ChapterTemplate, TemplateSegmenter};
use crate::transcript::{Caption, TranscriptChunker};
use crate::vocabulary::Vocabulary;
use crate::Result;

/// Confidence of a template boundary match.
pub const TEMPLATE_CONFIDENCE: f64 = 1.0;

/// A recoverable problem; the run continued with a degraded result.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// No top-level headings; the document became one section.
    NoHeadings,
    /// Headings were found but every span was skipped or too short.
    AllSpansFiltered,
    /// A template heading pattern matched no line.
    BoundaryNotFound {
        /// The pattern as configured.
        pattern: String,
    },
    /// The remote classifier failed for a batch; those spans were carried forward.
    ClassificationUnresolved {
        /// Error text from the collaborator.
        reason: String,
        /// Spans in the failed batch.
        spans: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHeadings => write!(f, "no section headings detected; whole document used"),
            Self::AllSpansFiltered => write!(f, "every section was filtered out; whole document used"),
            Self::BoundaryNotFound { pattern } => write!(f, "expected heading not found: {pattern:?}"),
            Self::ClassificationUnresolved { reason, spans } => {
                write!(f, "{spans} span(s) left unclassified: {reason}")
            }
        }
    }
}

/// Sections plus the warnings raised producing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Ordered output.
    pub sections: Vec<ConceptSection>,
    /// Recoverable problems, in the order they occurred.
    pub warnings: Vec<Warning>,
}

impl Report {
    /// Whether the run met no problems.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Papers: heading detection, keyword/remote classification, merging.
///
/// ## Example
///
/// ```rust
/// use sectioner::{DocumentPipeline, Vocabulary};
///
/// let filler = "word ".repeat(25);
/// let text = format!(
///     "**Abstract**\n{filler}\n## 1 Reliability\n{filler}\n## 2 Scaling Throughput\n{filler}\n## References\n[1] Kleppmann."
/// );
/// let report = DocumentPipeline::new(Vocabulary::ddia_chapter_one()).run("ddia-ch1", &text);
///
/// let ids: Vec<&str> = report.sections.iter().map(|s| s.concept_id.as_str()).collect();
/// assert_eq!(ids, ["reliability", "scalability"]);
/// assert_eq!(report.sections[0].heading_count, 2);
/// assert!(report.is_clean());
/// ```
#[derive(Debug)]
pub struct DocumentPipeline<'a> {
    segmenter: Segmenter,
    classifier: ConceptClassifier<'a>,
    layout: Layout,
}

impl<'a> DocumentPipeline<'a> {
    /// Keyword classification only, merged by concept.
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            segmenter: Segmenter::new(),
            classifier: ConceptClassifier::new(vocabulary),
            layout: Layout::ByConcept,
        }
    }

    /// Use a configured segmenter.
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Choose how spans become sections.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Add a remote fallback after keyword matching.
    #[must_use]
    pub fn with_remote<C: RemoteClassifier + 'a>(mut self, classifier: C, settings: BatchSettings) -> Self {
        self.classifier = self.classifier.with_remote(classifier, settings);
        self
    }

    /// Section one document.
    #[must_use]
    pub fn run(&self, resource_id: &str, text: &str) -> Report {
        let normalized = clean_page_artifacts(text);
        let segmentation = self.segmenter.segment(&normalized);
        let mut warnings = segmentation.warnings;

        let classified = self.classifier.classify(&segmentation.spans);
        warnings.extend(classified.warnings);

        let spans: Vec<ClassifiedSpan> = segmentation
            .spans
            .into_iter()
            .zip(classified.classifications)
            .map(|(span, class)| ClassifiedSpan {
                title: span.display_title(),
                concept_id: class.concept_id,
                content: span.content,
                confidence: Some(class.confidence),
            })
            .collect();

        let sections = Merger::new(resource_id)
            .with_layout(self.layout)
            .merge(&spans, self.classifier.vocabulary());
        info!(
            resource = resource_id,
            spans = spans.len(),
            sections = sections.len(),
            warnings = warnings.len(),
            "sectioned document"
        );
        Report { sections, warnings }
    }
}

/// Book chapters with a known table of contents.
///
/// ## Example
///
/// ```rust
/// use sectioner::{ChapterTemplate, TemplatePipeline};
///
/// let text = "**Reliability**\nFaults.\n**Scalability**\nLoad.\n**Maintainability**\nOps.\n**Summary**\nDone.";
/// let pipeline = TemplatePipeline::new(&ChapterTemplate::ddia_chapter_one()).unwrap();
/// let report = pipeline.run("ddia-ch1", text);
///
/// assert_eq!(report.sections.len(), 4);
/// assert_eq!(report.sections[3].section_title, "Summary");
/// assert_eq!(report.warnings.len(), 1); // "Thinking About Data Systems" is missing
/// ```
#[derive(Debug, Clone)]
pub struct TemplatePipeline {
    segmenter: TemplateSegmenter,
}

impl TemplatePipeline {
    /// Compile a template.
    ///
    /// # Errors
    ///
    /// As [`ChapterTemplate::compile`].
    pub fn new(template: &ChapterTemplate) -> Result<Self> {
        Ok(Self {
            segmenter: template.compile()?,
        })
    }

    /// Section one chapter.
    #[must_use]
    pub fn run(&self, resource_id: &str, text: &str) -> Report {
        let normalized = clean_page_artifacts(text);
        let segmentation = self.segmenter.segment(&normalized);

        let spans: Vec<ClassifiedSpan> = segmentation
            .spans
            .into_iter()
            .map(|span| ClassifiedSpan {
                concept_id: span.concept_id,
                title: span.title,
                content: span.content,
                confidence: Some(TEMPLATE_CONFIDENCE),
            })
            .collect();

        let sections = Merger::new(resource_id).merge(&spans, self.segmenter.vocabulary());
        info!(
            resource = resource_id,
            spans = spans.len(),
            sections = sections.len(),
            warnings = segmentation.warnings.len(),
            "sectioned chapter"
        );
        Report {
            sections,
            warnings: segmentation.warnings,
        }
    }
}

/// Time-coded transcripts.
///
/// ## Example
///
/// ```rust
/// use sectioner::{Caption, TranscriptChunker, TranscriptPipeline};
///
/// let captions = vec![Caption::new("[Music] hello and welcome", 0.0, 3.0)];
/// let pipeline = TranscriptPipeline::new(TranscriptChunker::default(), "to-be-mapped");
/// let report = pipeline.run("youtube-dQw4w9WgXcQ", &captions);
///
/// assert_eq!(report.sections[0].section_title, "Part 1 (0:00 - 0:03)");
/// assert_eq!(report.sections[0].content_original, "hello and welcome");
/// ```
#[derive(Debug, Clone)]
pub struct TranscriptPipeline {
    chunker: TranscriptChunker,
    concept_id: String,
}

impl TranscriptPipeline {
    /// Chunk with `chunker`, tagging every section `concept_id`.
    pub fn new(chunker: TranscriptChunker, concept_id: impl Into<String>) -> Self {
        Self {
            chunker,
            concept_id: concept_id.into(),
        }
    }

    /// Section one transcript.
    #[must_use]
    pub fn run(&self, resource_id: &str, captions: &[Caption]) -> Report {
        let sections: Vec<ConceptSection> = self
            .chunker
            .chunk(captions)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                ConceptSection::new(resource_id, &self.concept_id, chunk.title(i), i, chunk.text, None)
            })
            .collect();
        info!(
            resource = resource_id,
            captions = captions.len(),
            sections = sections.len(),
            "sectioned transcript"
        );
        Report {
            sections,
            warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_nothing() {
        let report = DocumentPipeline::new(Vocabulary::ddia_chapter_one()).run("r", "");
        assert!(report.sections.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_page_artifacts_removed_before_segmenting() {
        let filler = "word ".repeat(25);
        let text = format!("**Abstract**\n{filler}\n12\n{filler}");
        let report = DocumentPipeline::new(Vocabulary::single("paper")).run("r", &text);
        assert_eq!(report.sections.len(), 1);
        assert!(!report.sections[0].content_original.contains("12"));
    }

    #[test]
    fn test_per_span_layout_titles() {
        let filler = "word ".repeat(25);
        let text = format!("## 1 Introduction\n{filler}\n## 2 Retrieval\n{filler}");
        let report = DocumentPipeline::new(Vocabulary::single("rag"))
            .with_layout(Layout::PerSpan)
            .run("arxiv-2005.11401", &text);
        let titles: Vec<&str> = report.sections.iter().map(|s| s.section_title.as_str()).collect();
        assert_eq!(titles, ["1. Introduction", "2. Retrieval"]);
        assert!(report.sections.iter().all(|s| s.concept_id == "rag"));
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::ClassificationUnresolved {
            reason: "timeout".into(),
            spans: 3,
        };
        assert_eq!(w.to_string(), "3 span(s) left unclassified: timeout");
    }
}
