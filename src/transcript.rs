//! Chunking time-coded transcripts.
//!
//! ## The Problem
//!
//! Captions arrive as a flat stream of short, timed fragments:
//!
//! ```text
//! 12.0s +2.1  "so the key idea here is"
//! 14.1s +1.9  "that attention lets every token"
//! 16.0s +2.4  "look at every other token."
//! 24.8s +1.7  "Now, positional encodings."     <- 6.4s of silence before this
//! ```
//!
//! There are no headings, so the only structure available is timing and
//! punctuation. Speakers pause between topics; a gap of five seconds or
//! more is the most reliable boundary there is.
//!
//! ## The Algorithm
//!
//! One forward pass, no backtracking. Fragments are appended to a running
//! chunk; after each append the chunk is closed on the first rule that fires:
//!
//! | Rule | Condition |
//! |------|-----------|
//! | a | last fragment |
//! | b | words >= target and a silence gap follows |
//! | c | words >= 1.3 x target |
//! | d | words >= target and the fragment ends a sentence |
//! | e | words >= 0.7 x target and a silence gap follows |
//!
//! Rule (a) guarantees termination, so a stream that ends abruptly may leave
//! a final chunk well below 0.7 x target. That is accepted: completeness
//! wins over uniform sizes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capacity::{ChunkCapacity, Fill};
use crate::normalize::{normalize_transcript, strip_caption_markers, word_count};
use crate::Result;

/// Seconds of silence that count as a natural boundary.
pub const SILENCE_GAP_SECS: f64 = 5.0;

/// Punctuation that ends a sentence (or a clause worth cutting at).
const SENTENCE_END: [char; 5] = ['.', '!', '?', ':', ';'];

/// A raw caption entry as delivered by a transcript source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// Caption text, markers and all.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl Caption {
    /// A caption entry.
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// A cleaned caption with derived timing.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptFragment {
    /// Text with caption markers removed.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// `start + duration`.
    pub end: f64,
    /// Seconds until the next caption starts; 0 for the last one.
    pub gap_after: f64,
    /// Words in `text`.
    pub word_count: usize,
}

impl TranscriptFragment {
    fn ends_sentence(&self) -> bool {
        self.text.trim_end().ends_with(SENTENCE_END)
    }
}

/// Clean captions into fragments, dropping those with no speech left.
///
/// A dropped caption still bounds the gap of the fragment before it.
#[must_use]
pub fn fragments(captions: &[Caption]) -> Vec<TranscriptFragment> {
    captions
        .iter()
        .enumerate()
        .filter_map(|(i, caption)| {
            let text = strip_caption_markers(&caption.text);
            if text.is_empty() {
                return None;
            }
            let end = caption.start + caption.duration;
            let gap_after = captions.get(i + 1).map_or(0.0, |next| next.start - end);
            Some(TranscriptFragment {
                word_count: word_count(&text),
                text,
                start: caption.start,
                duration: caption.duration,
                end,
                gap_after,
            })
        })
        .collect()
}

/// Why a chunk was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Rule a: the stream ended.
    FinalFragment,
    /// Rule b: target reached at a silence gap.
    SilenceAtTarget,
    /// Rule c: hard ceiling reached.
    Ceiling,
    /// Rule d: target reached at a sentence end.
    SentenceEnd,
    /// Rule e: close to target at a silence gap.
    EarlySilence,
}

/// A group of fragments emitted as one section.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptChunk {
    /// Joined, normalized text.
    pub text: String,
    /// Start of the first fragment, seconds.
    pub start: f64,
    /// End of the last fragment, seconds.
    pub end: f64,
    /// Words in `text`.
    pub word_count: usize,
    /// The rule that closed this chunk.
    pub closed_by: CloseReason,
}

impl TranscriptChunk {
    /// `"Part 3 (10:05 - 14:40)"` for the chunk at zero-based `index`.
    #[must_use]
    pub fn title(&self, index: usize) -> String {
        format!(
            "Part {} ({} - {})",
            index + 1,
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

/// `M:SS`, or `H:MM:SS` past the hour. Fractions are truncated.
///
/// ```rust
/// use sectioner::format_timestamp;
///
/// assert_eq!(format_timestamp(65.9), "1:05");
/// assert_eq!(format_timestamp(3725.0), "1:02:05");
/// ```
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Gap- and length-driven transcript chunker.
///
/// ## Example
///
/// ```rust
/// use sectioner::{Caption, TranscriptChunker};
///
/// let captions = vec![
///     Caption::new("one two three", 0.0, 2.0),
///     Caption::new("four five.", 2.0, 2.0),
///     Caption::new("[Music]", 4.0, 8.0),
///     Caption::new("six seven", 12.0, 2.0),
/// ];
/// let chunks = TranscriptChunker::new(5).unwrap().chunk(&captions);
///
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].text, "one two three four five.");
/// assert_eq!(chunks[1].title(1), "Part 2 (0:12 - 0:14)");
/// ```
#[derive(Debug, Clone)]
pub struct TranscriptChunker {
    capacity: ChunkCapacity,
    silence_gap: f64,
}

impl TranscriptChunker {
    /// A chunker aiming for `target_words` per chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkTarget`](crate::Error::InvalidChunkTarget)
    /// if `target_words == 0`.
    pub fn new(target_words: usize) -> Result<Self> {
        Ok(Self::with_capacity(ChunkCapacity::new(target_words)?))
    }

    /// A chunker with explicit thresholds.
    #[must_use]
    pub fn with_capacity(capacity: ChunkCapacity) -> Self {
        Self {
            capacity,
            silence_gap: SILENCE_GAP_SECS,
        }
    }

    /// Change the silence threshold in seconds.
    #[must_use]
    pub fn with_silence_gap(mut self, seconds: f64) -> Self {
        self.silence_gap = seconds;
        self
    }

    /// The chunk capacity in use.
    #[must_use]
    pub fn capacity(&self) -> ChunkCapacity {
        self.capacity
    }

    /// Decide whether the running chunk closes after `fragment`.
    fn close_reason(
        &self,
        fragment: &TranscriptFragment,
        words: usize,
        is_last: bool,
    ) -> Option<CloseReason> {
        let silence = fragment.gap_after >= self.silence_gap;
        let fill = self.capacity.fill(words);
        if is_last {
            Some(CloseReason::FinalFragment)
        } else if fill >= Fill::Target && silence {
            Some(CloseReason::SilenceAtTarget)
        } else if fill == Fill::Over {
            Some(CloseReason::Ceiling)
        } else if fill >= Fill::Target && fragment.ends_sentence() {
            Some(CloseReason::SentenceEnd)
        } else if fill >= Fill::Early && silence {
            Some(CloseReason::EarlySilence)
        } else {
            None
        }
    }

    /// Group captions into chunks near the target size.
    #[must_use]
    pub fn chunk(&self, captions: &[Caption]) -> Vec<TranscriptChunk> {
        let fragments = fragments(captions);
        let mut chunks = Vec::new();

        let mut texts: Vec<&str> = Vec::new();
        let mut words = 0usize;
        let mut chunk_start: Option<f64> = None;

        for (i, fragment) in fragments.iter().enumerate() {
            texts.push(&fragment.text);
            words += fragment.word_count;
            let start = *chunk_start.get_or_insert(fragment.start);

            let Some(reason) = self.close_reason(fragment, words, i + 1 == fragments.len()) else {
                continue;
            };

            let text = normalize_transcript(&texts.join(" "));
            let count = word_count(&text);
            if count > 0 {
                debug!(words = count, ?reason, "closing transcript chunk");
                chunks.push(TranscriptChunk {
                    text,
                    start,
                    end: fragment.end,
                    word_count: count,
                    closed_by: reason,
                });
            }

            texts.clear();
            words = 0;
            chunk_start = None;
        }

        chunks
    }
}

impl Default for TranscriptChunker {
    fn default() -> Self {
        Self::with_capacity(ChunkCapacity::default())
    }
}
