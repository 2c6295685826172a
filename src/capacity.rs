//! Word budgets for transcript chunks.
//!
//! ## The Problem
//!
//! A transcript chunk should be close to a target size, but the best place
//! to cut is a pause in speech, and pauses do not arrive on schedule:
//!
//! ```text
//! Target: 500 words
//!
//!   0 ........ 350 ........ 500 ........ 650
//!   |  keep    | pause ok   | pause or   | cut no
//!   |  going   | cut early  | sentence   | matter what
//! ```
//!
//! ## The Solution: Three Thresholds
//!
//! `ChunkCapacity` derives three thresholds from one target:
//!
//! - `early` (0.7x): from here a silence gap is reason enough to close.
//! - `target` (1.0x): from here a silence gap or a sentence end closes.
//! - `max` (1.3x): the ceiling; the chunk closes regardless of boundaries.

use crate::{Error, Result};

/// Fraction of the target at which a silence gap may close a chunk.
pub const DEFAULT_EARLY_FACTOR: f64 = 0.7;

/// Multiple of the target at which a chunk is closed unconditionally.
pub const DEFAULT_MAX_FACTOR: f64 = 1.3;

/// Where a running word count sits relative to a [`ChunkCapacity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Fill {
    /// Below the early threshold: keep accumulating.
    Below,
    /// At or past `early`, below `target`.
    Early,
    /// At or past `target`, below `max`.
    Target,
    /// At or past `max`.
    Over,
}

/// Target chunk size in words, with early and hard-ceiling thresholds.
///
/// # Examples
///
/// ```rust
/// use sectioner::{ChunkCapacity, Fill};
///
/// let cap = ChunkCapacity::new(500).unwrap();
/// assert_eq!(cap.fill(349), Fill::Below);
/// assert_eq!(cap.fill(350), Fill::Early);
/// assert_eq!(cap.fill(500), Fill::Target);
/// assert_eq!(cap.fill(650), Fill::Over);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkCapacity {
    target: usize,
    early_factor: f64,
    max_factor: f64,
}

impl ChunkCapacity {
    /// A capacity with the default 0.7x / 1.3x thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkTarget`] if `target == 0`.
    pub fn new(target: usize) -> Result<Self> {
        if target == 0 {
            return Err(Error::InvalidChunkTarget(target));
        }
        Ok(Self {
            target,
            early_factor: DEFAULT_EARLY_FACTOR,
            max_factor: DEFAULT_MAX_FACTOR,
        })
    }

    /// Override the early and ceiling factors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless `0 < early <= 1 <= max`.
    ///
    /// ```rust
    /// use sectioner::{ChunkCapacity, Fill};
    ///
    /// let cap = ChunkCapacity::new(100).unwrap().with_factors(0.5, 2.0).unwrap();
    /// assert_eq!(cap.fill(50), Fill::Early);
    /// assert_eq!(cap.fill(200), Fill::Over);
    /// assert!(ChunkCapacity::new(100).unwrap().with_factors(1.2, 1.1).is_err());
    /// ```
    pub fn with_factors(self, early: f64, max: f64) -> Result<Self> {
        if !(early > 0.0 && early <= 1.0 && max >= 1.0) {
            return Err(Error::Config(format!(
                "chunk factors must satisfy 0 < early <= 1 <= max (got early={early}, max={max})"
            )));
        }
        Ok(Self {
            early_factor: early,
            max_factor: max,
            ..self
        })
    }

    /// The target size in words.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Classify a running word count.
    #[must_use]
    pub fn fill(&self, words: usize) -> Fill {
        let words = words as f64;
        let target = self.target as f64;
        if words >= target * self.max_factor {
            Fill::Over
        } else if words >= target {
            Fill::Target
        } else if words >= target * self.early_factor {
            Fill::Early
        } else {
            Fill::Below
        }
    }

}

impl Default for ChunkCapacity {
    fn default() -> Self {
        Self {
            target: 500,
            early_factor: DEFAULT_EARLY_FACTOR,
            max_factor: DEFAULT_MAX_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let cap = ChunkCapacity::new(100).unwrap();
        assert_eq!(cap.fill(0), Fill::Below);
        assert_eq!(cap.fill(69), Fill::Below);
        assert_eq!(cap.fill(70), Fill::Early);
        assert_eq!(cap.fill(99), Fill::Early);
        assert_eq!(cap.fill(100), Fill::Target);
        assert_eq!(cap.fill(129), Fill::Target);
        assert_eq!(cap.fill(130), Fill::Over);
    }

    #[test]
    fn test_fractional_thresholds_round_up() {
        // 1.3 * 7 = 9.1, so 9 words is not yet over.
        let cap = ChunkCapacity::new(7).unwrap();
        assert_eq!(cap.fill(9), Fill::Target);
        assert_eq!(cap.fill(10), Fill::Over);
    }

    #[test]
    fn test_fill_is_ordered() {
        let cap = ChunkCapacity::new(10).unwrap();
        assert!(cap.fill(7) >= Fill::Early);
        assert!(cap.fill(9) < Fill::Target);
        assert!(cap.fill(13) > Fill::Target);
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(matches!(ChunkCapacity::new(0), Err(Error::InvalidChunkTarget(0))));
    }

    #[test]
    fn test_default_is_500() {
        assert_eq!(ChunkCapacity::default().target(), 500);
    }
}
