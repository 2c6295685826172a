//! Closed concept vocabularies.
//!
//! A vocabulary is the fixed, ordered list of concept ids a document may be
//! sectioned into, each with the lowercase keywords that identify it in a
//! heading. Order matters twice: the first concept whose keyword matches a
//! heading wins, and merged sections come out in vocabulary order.
//!
//! Vocabularies are plain values handed to a pipeline, never globals, so
//! two document types can be processed side by side.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One concept: an id, its heading keywords, and an optional display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Stable identifier, e.g. `"scalability"`.
    pub id: String,
    /// Lowercase substrings that identify this concept in a heading.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Section title for merged output; derived from the id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Concept {
    /// A concept with keywords and a derived title.
    pub fn new<I, S>(id: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            title: None,
        }
    }

    /// Set an explicit display title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The display title: explicit, or the id in title case.
    ///
    /// ```rust
    /// use sectioner::Concept;
    ///
    /// let concept = Concept::new("tail-latency", ["p99"]);
    /// assert_eq!(concept.display_title(), "Tail Latency");
    /// ```
    #[must_use]
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => title_case(&self.id),
        }
    }
}

/// `"tail-latency"` -> `"Tail Latency"`.
fn title_case(id: &str) -> String {
    id.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// An ordered, closed set of concepts.
///
/// ```rust
/// use sectioner::{Concept, Vocabulary};
///
/// let vocab = Vocabulary::new(vec![
///     Concept::new("reliability", ["fault", "failure"]),
///     Concept::new("scalability", ["load", "throughput"]),
/// ])
/// .unwrap();
///
/// assert_eq!(vocab.keyword_match("Describing Throughput").map(|c| c.id.as_str()), Some("scalability"));
/// assert!(vocab.keyword_match("Summary").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Concept>", into = "Vec<Concept>")]
pub struct Vocabulary {
    concepts: Vec<Concept>,
}

impl Vocabulary {
    /// Build a vocabulary, lowercasing keywords.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyVocabulary`] for an empty list and
    /// [`Error::DuplicateConcept`] when an id repeats.
    pub fn new(concepts: Vec<Concept>) -> Result<Self> {
        if concepts.is_empty() {
            return Err(Error::EmptyVocabulary);
        }
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(concepts.len());
        for mut concept in concepts {
            if !seen.insert(concept.id.clone()) {
                return Err(Error::DuplicateConcept(concept.id));
            }
            concept.keywords = concept
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            normalized.push(concept);
        }
        Ok(Self {
            concepts: normalized,
        })
    }

    /// A vocabulary of exactly one keyword-less concept.
    ///
    /// Used for transcripts and for papers ingested under a single concept.
    #[must_use]
    pub fn single(id: impl Into<String>) -> Self {
        Self {
            concepts: vec![Concept::new(id, Vec::<String>::new())],
        }
    }

    /// Concepts in vocabulary order.
    #[must_use]
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Concept ids in vocabulary order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.concepts.iter().map(|c| c.id.as_str())
    }

    /// The first concept; the carry-forward default when nothing precedes a span.
    #[must_use]
    pub fn first(&self) -> &Concept {
        // Non-empty by construction.
        &self.concepts[0]
    }

    /// Look up a concept by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.id == id)
    }

    /// Whether `id` belongs to this vocabulary.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Number of concepts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// First concept (in vocabulary order) with a keyword contained in `heading`.
    #[must_use]
    pub fn keyword_match(&self, heading: &str) -> Option<&Concept> {
        let lowered = heading.to_lowercase();
        self.concepts
            .iter()
            .find(|c| c.keywords.iter().any(|k| lowered.contains(k.as_str())))
    }

    /// The vocabulary for DDIA chapter 1.
    #[must_use]
    pub fn ddia_chapter_one() -> Self {
        Self {
            concepts: vec![
                Concept::new(
                    "reliability",
                    [
                        "reliability",
                        "reliable",
                        "fault",
                        "failure",
                        "hardware fault",
                        "software error",
                        "human error",
                    ],
                ),
                Concept::new(
                    "scalability",
                    [
                        "scalability",
                        "scalable",
                        "load",
                        "performance",
                        "throughput",
                        "latency",
                        "percentile",
                        "tail latency",
                        "fan-out",
                    ],
                ),
                Concept::new(
                    "maintainability",
                    [
                        "maintainability",
                        "maintainable",
                        "operability",
                        "simplicity",
                        "evolvability",
                        "abstraction",
                    ],
                ),
            ],
        }
    }
}

impl TryFrom<Vec<Concept>> for Vocabulary {
    type Error = Error;

    fn try_from(concepts: Vec<Concept>) -> Result<Self> {
        Self::new(concepts)
    }
}

impl From<Vocabulary> for Vec<Concept> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.concepts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vocabulary_rejected() {
        assert!(matches!(Vocabulary::new(vec![]), Err(Error::EmptyVocabulary)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = Vocabulary::new(vec![
            Concept::new("a", ["x"]),
            Concept::new("a", ["y"]),
        ]);
        assert!(matches!(result, Err(Error::DuplicateConcept(id)) if id == "a"));
    }

    #[test]
    fn test_keywords_lowercased() {
        let vocab = Vocabulary::new(vec![Concept::new("load", ["  Throughput "])]).unwrap();
        assert_eq!(vocab.concepts()[0].keywords, ["throughput"]);
        assert!(vocab.keyword_match("THROUGHPUT at scale").is_some());
    }

    #[test]
    fn test_first_matching_concept_wins() {
        let vocab = Vocabulary::ddia_chapter_one();
        // "fault" (reliability) and "load" (scalability) both appear.
        let hit = vocab.keyword_match("Fault tolerance under load").unwrap();
        assert_eq!(hit.id, "reliability");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("reliability"), "Reliability");
        assert_eq!(title_case("unreliable-networks"), "Unreliable Networks");
        assert_eq!(
            Concept::new("x", Vec::<String>::new()).with_title("Fiabilidad").display_title(),
            "Fiabilidad"
        );
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = r#"[{"id":"a","keywords":["One"]},{"id":"b"}]"#;
        let vocab: Vocabulary = serde_json::from_str(json).unwrap();
        assert_eq!(vocab.ids().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(vocab.concepts()[0].keywords, ["one"]);

        let dup = r#"[{"id":"a"},{"id":"a"}]"#;
        assert!(serde_json::from_str::<Vocabulary>(dup).is_err());
    }
}
