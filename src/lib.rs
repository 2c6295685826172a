//! # sectioner
//!
//! Concept-level sectioning for research papers, book chapters, and
//! time-coded transcripts.
//!
//! ## The Problem
//!
//! A learning platform wants every resource cut into sections that each
//! teach one concept, so sections can be translated, stored, and linked
//! into a concept graph. The raw material is messy:
//!
//! - PDF extraction leaves page numbers, running headers, and bold footers
//!   that look like headings
//! - The same heading arrives as `**1** **Introduction**`, `## 1 Introduction`,
//!   or `**1 Introduction**`
//! - Headings name what a section *is* ("Describing Load"), not which
//!   concept it teaches ("scalability")
//! - Transcripts have no headings at all, only timing
//!
//! ## The Pipeline
//!
//! ```text
//!  paper text ──► normalize ──► detect headings ──► segment ──► classify ──► merge ──► ConceptSection[]
//!
//!  chapter text ──► normalize ──► template boundaries ─────────────────────► merge ──► ConceptSection[]
//!
//!  captions ──► clean fragments ──► chunk by silence / size ───────────────────────► ConceptSection[]
//! ```
//!
//! ### Segmentation
//!
//! Only *top-level* headings open spans: unnumbered known names
//! ("Abstract") and single-integer numbers ("2 Method"). A span runs to the
//! next top-level heading, so "2.1 Setup" stays inside "2 Method". Skip
//! sections (References, Appendix) close the span before them and are then
//! dropped. Spans under twenty words are dropped as extraction noise.
//!
//! ### Classification
//!
//! A cascade of strategies, each seeing only what the previous left over:
//!
//! | Step | Evidence | Confidence |
//! |------|----------|------------|
//! | keyword | vocabulary keyword in the heading | 1.0 |
//! | remote | a language model picks from the vocabulary | model-reported |
//! | carry forward | the nearest preceding span's concept | 0.3 |
//!
//! ### Transcript Chunking
//!
//! Fragments accumulate until a boundary rule fires: a silence gap of five
//! seconds once the chunk is near its target, a sentence end once it has
//! reached the target, or the 1.3x ceiling regardless.
//!
//! ## Quick Start
//!
//! ```rust
//! use sectioner::{DocumentPipeline, Vocabulary};
//!
//! let filler = "lorem ".repeat(30);
//! let paper = format!(
//!     "**Abstract**\n{filler}\n\
//!      ## 1 Faults and Failures\n{filler}\n\
//!      ## 2 Throughput Under Load\n{filler}\n\
//!      ## References\n[1] A. Author."
//! );
//!
//! let report = DocumentPipeline::new(Vocabulary::ddia_chapter_one()).run("ddia-ch1", &paper);
//! for section in &report.sections {
//!     println!("{section}");
//! }
//! assert_eq!(report.sections.len(), 2);
//! ```
//!
//! ## Degraded Modes
//!
//! Nothing short of missing configuration stops a run. A document with no
//! headings becomes one section; a template heading that is not found, or a
//! remote classifier that is down, produces a [`Warning`] in the [`Report`]
//! and a log line, and the run continues.
//!
//! ## Features
//!
//! - `remote`: `OpenAiCompatClassifier`, a blocking client for any
//!   OpenAI-compatible chat-completions endpoint.
//! - `cli` (default): the `sectioner` binary.

mod capacity;
mod classify;
mod config;
mod error;
mod heading;
mod merge;
mod normalize;
mod pipeline;
mod remote;
mod resource;
mod section;
mod segment;
mod template;
mod transcript;
mod vocabulary;

pub use capacity::{ChunkCapacity, Fill, DEFAULT_EARLY_FACTOR, DEFAULT_MAX_FACTOR};
pub use classify::{
    BatchSettings, Classification, Classified, ClassifyStep, ConceptClassifier, KeywordStep, Method, RemoteStep,
    StepOutcome, CARRY_FORWARD_CONFIDENCE, KEYWORD_CONFIDENCE,
};
pub use config::{
    Config, Credentials, RemoteSettings, SegmentSettings, TranscriptSettings, BUILTIN_DDIA_CHAPTER_ONE,
    DEFAULT_TRANSCRIPT_CONCEPT, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL,
};
pub use error::{Error, Result};
pub use heading::{detect_heading, detect_headings, is_skip_title, strip_emphasis, HeadingCandidate, HeadingMatch};
pub use merge::{ClassifiedSpan, Layout, Merger};
pub use normalize::{
    char_count, clean_page_artifacts, dedupe_stutter, normalize_transcript, strip_caption_markers, word_count,
    MAX_STUTTER_REPEAT,
};
pub use pipeline::{DocumentPipeline, Report, TemplatePipeline, TranscriptPipeline, Warning};
pub use remote::{
    build_prompt, parse_verdicts, ClassificationRequest, RemoteClassifier, RemoteVerdict, SpanPreview,
    DEFAULT_PREVIEW_CHARS,
};
pub use resource::{arxiv_resource_id, youtube_resource_id, youtube_video_id};
pub use section::ConceptSection;
pub use segment::{Segmentation, Segmenter, StructuralSpan, DEFAULT_MIN_SPAN_WORDS};
pub use template::{ChapterTemplate, TemplateSection, TemplateSegmentation, TemplateSegmenter, TemplateSpan};
pub use transcript::{
    format_timestamp, fragments, Caption, CloseReason, TranscriptChunk, TranscriptChunker, TranscriptFragment,
    SILENCE_GAP_SECS,
};
pub use vocabulary::{Concept, Vocabulary};

#[cfg(feature = "remote")]
pub use remote::OpenAiCompatClassifier;
