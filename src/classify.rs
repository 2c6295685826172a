//! Assigning concepts to structural spans.
//!
//! ## The Cascade
//!
//! Classification is an ordered chain of steps. Each step sees only the spans
//! every earlier step left unresolved, and may resolve any subset of them:
//!
//! ```text
//! spans ──► KeywordStep ──► RemoteStep ──► carry forward
//!           conf = 1.0      conf = model   conf = 0.3
//!           no I/O          batched, may   never fails
//!                           fail (warning)
//! ```
//!
//! The final carry-forward is not a step; it always runs and gives each
//! remaining span the concept of the nearest preceding span (or the
//! vocabulary's first concept). Every span therefore leaves the classifier
//! with a concept, however weak the evidence.
//!
//! Adding a strategy means implementing [`ClassifyStep`] and pushing it onto
//! the chain; no step knows about any other.

use std::time::Duration;

use tracing::{debug, warn};

use crate::remote::{ClassificationRequest, RemoteClassifier, SpanPreview, DEFAULT_PREVIEW_CHARS};
use crate::segment::StructuralSpan;
use crate::vocabulary::Vocabulary;
use crate::Warning;

/// Confidence given to spans that inherited their concept.
pub const CARRY_FORWARD_CONFIDENCE: f64 = 0.3;

/// Confidence given to keyword matches.
pub const KEYWORD_CONFIDENCE: f64 = 1.0;

/// Which strategy produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// A vocabulary keyword occurred in the heading.
    Keyword,
    /// The remote collaborator chose it.
    Remote,
    /// Inherited from the preceding span.
    CarryForward,
}

/// A concept assignment for one span.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Concept id from the vocabulary.
    pub concept_id: String,
    /// In [0, 1].
    pub confidence: f64,
    /// How it was decided.
    pub method: Method,
}

impl Classification {
    fn new(concept_id: impl Into<String>, confidence: f64, method: Method) -> Self {
        Self {
            concept_id: concept_id.into(),
            confidence,
            method,
        }
    }
}

/// What one step decided for the spans it was given.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Aligned with the `pending` slice the step received.
    pub verdicts: Vec<Option<Classification>>,
    /// Recoverable problems the step ran into.
    pub warnings: Vec<Warning>,
}

impl StepOutcome {
    fn unresolved(len: usize) -> Self {
        Self {
            verdicts: vec![None; len],
            warnings: Vec::new(),
        }
    }
}

/// One strategy in the classification chain.
pub trait ClassifyStep {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Try to classify `pending`, a subset of spans in document order.
    ///
    /// Must return exactly one verdict per pending span.
    fn resolve(&self, pending: &[&StructuralSpan], vocabulary: &Vocabulary) -> StepOutcome;
}

/// Heading substring match against vocabulary keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordStep;

impl ClassifyStep for KeywordStep {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn resolve(&self, pending: &[&StructuralSpan], vocabulary: &Vocabulary) -> StepOutcome {
        let verdicts = pending
            .iter()
            .map(|span| {
                vocabulary
                    .keyword_match(&span.title)
                    .map(|c| Classification::new(&c.id, KEYWORD_CONFIDENCE, Method::Keyword))
            })
            .collect();
        StepOutcome {
            verdicts,
            warnings: Vec::new(),
        }
    }
}

/// Batching and pacing for [`RemoteStep`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSettings {
    /// Spans per request; 0 means one request for everything.
    pub batch_size: usize,
    /// Pause between successive requests.
    pub delay: Duration,
    /// Content characters sent per span.
    pub preview_chars: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 20,
            delay: Duration::from_millis(500),
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

/// Ask a remote collaborator about whatever keywords could not place.
#[derive(Debug, Clone)]
pub struct RemoteStep<C> {
    classifier: C,
    settings: BatchSettings,
}

impl<C: RemoteClassifier> RemoteStep<C> {
    /// Wrap a collaborator.
    pub fn new(classifier: C, settings: BatchSettings) -> Self {
        Self { classifier, settings }
    }
}

impl<C: RemoteClassifier> ClassifyStep for RemoteStep<C> {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn resolve(&self, pending: &[&StructuralSpan], vocabulary: &Vocabulary) -> StepOutcome {
        let mut outcome = StepOutcome::unresolved(pending.len());
        if pending.is_empty() {
            return outcome;
        }

        let concept_ids: Vec<String> = vocabulary.ids().map(str::to_string).collect();
        let batch_size = if self.settings.batch_size == 0 {
            pending.len()
        } else {
            self.settings.batch_size
        };

        for (batch_no, batch) in pending.chunks(batch_size).enumerate() {
            if batch_no > 0 && !self.settings.delay.is_zero() {
                std::thread::sleep(self.settings.delay);
            }
            let offset = batch_no * batch_size;
            let request = ClassificationRequest {
                concept_ids: concept_ids.clone(),
                items: batch
                    .iter()
                    .map(|span| SpanPreview::new(&span.title, &span.content, self.settings.preview_chars))
                    .collect(),
            };

            match self.classifier.classify(&request) {
                Ok(verdicts) => {
                    debug!(batch = batch_no, sent = batch.len(), answered = verdicts.len(), "remote batch classified");
                    for verdict in verdicts {
                        // Implementations may skip validation; re-check here.
                        if verdict.span_index >= batch.len() || !vocabulary.contains(&verdict.concept_id) {
                            continue;
                        }
                        outcome.verdicts[offset + verdict.span_index] = Some(Classification::new(
                            verdict.concept_id,
                            verdict.confidence.clamp(0.0, 1.0),
                            Method::Remote,
                        ));
                    }
                }
                Err(err) => {
                    warn!(error = %err, spans = batch.len(), "remote classification failed; spans left unresolved");
                    outcome.warnings.push(Warning::ClassificationUnresolved {
                        reason: err.to_string(),
                        spans: batch.len(),
                    });
                }
            }
        }
        outcome
    }
}

/// Spans' classifications plus any warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// One per input span, same order.
    pub classifications: Vec<Classification>,
    /// Recoverable problems.
    pub warnings: Vec<Warning>,
}

/// The classification chain for one vocabulary.
///
/// ## Example
///
/// ```rust
/// use sectioner::{ConceptClassifier, Method, Segmenter, Vocabulary};
///
/// let filler = "word ".repeat(25);
/// let text = format!("## 1 Describing Load\n{filler}\n## 2 Closing Notes\n{filler}");
/// let spans = Segmenter::new().segment(&text).spans;
///
/// let result = ConceptClassifier::new(Vocabulary::ddia_chapter_one()).classify(&spans);
/// assert_eq!(result.classifications[0].concept_id, "scalability");
/// assert_eq!(result.classifications[0].method, Method::Keyword);
/// assert_eq!(result.classifications[1].concept_id, "scalability");
/// assert_eq!(result.classifications[1].method, Method::CarryForward);
/// ```
pub struct ConceptClassifier<'a> {
    vocabulary: Vocabulary,
    steps: Vec<Box<dyn ClassifyStep + 'a>>,
}

impl<'a> ConceptClassifier<'a> {
    /// Keyword matching followed by carry-forward.
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            steps: vec![Box::new(KeywordStep)],
        }
    }

    /// Append a step to the chain.
    #[must_use]
    pub fn with_step(mut self, step: impl ClassifyStep + 'a) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append a remote fallback step.
    #[must_use]
    pub fn with_remote<C: RemoteClassifier + 'a>(self, classifier: C, settings: BatchSettings) -> Self {
        self.with_step(RemoteStep::new(classifier, settings))
    }

    /// The vocabulary in use.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Classify every span.
    #[must_use]
    pub fn classify(&self, spans: &[StructuralSpan]) -> Classified {
        let mut resolved: Vec<Option<Classification>> = vec![None; spans.len()];
        let mut warnings = Vec::new();

        for step in &self.steps {
            let pending: Vec<usize> = (0..spans.len()).filter(|&i| resolved[i].is_none()).collect();
            if pending.is_empty() {
                break;
            }
            let views: Vec<&StructuralSpan> = pending.iter().map(|&i| &spans[i]).collect();
            let outcome = step.resolve(&views, &self.vocabulary);
            let mut hits = 0usize;
            for (&i, verdict) in pending.iter().zip(outcome.verdicts) {
                if verdict.is_some() {
                    hits += 1;
                    resolved[i] = verdict;
                }
            }
            debug!(step = step.name(), pending = pending.len(), resolved = hits, "classification step done");
            warnings.extend(outcome.warnings);
        }

        Classified {
            classifications: carry_forward(resolved, &self.vocabulary),
            warnings,
        }
    }
}

impl std::fmt::Debug for ConceptClassifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let steps: Vec<&str> = self.steps.iter().map(|s| s.name()).collect();
        f.debug_struct("ConceptClassifier")
            .field("vocabulary", &self.vocabulary)
            .field("steps", &steps)
            .finish()
    }
}

/// Fill gaps with the nearest preceding concept, or the first one.
fn carry_forward(resolved: Vec<Option<Classification>>, vocabulary: &Vocabulary) -> Vec<Classification> {
    let mut previous = vocabulary.first().id.clone();
    resolved
        .into_iter()
        .map(|slot| match slot {
            Some(c) => {
                previous.clone_from(&c.concept_id);
                c
            }
            None => Classification::new(previous.clone(), CARRY_FORWARD_CONFIDENCE, Method::CarryForward),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::remote::RemoteVerdict;
    use crate::{Error, Result};

    fn span(title: &str) -> StructuralSpan {
        StructuralSpan {
            start_line: 0,
            end_line: 1,
            title: title.to_string(),
            number: None,
            content: format!("{title} body"),
        }
    }

    struct Scripted {
        calls: Cell<usize>,
        answer: fn(&ClassificationRequest) -> Result<Vec<RemoteVerdict>>,
    }

    impl RemoteClassifier for Scripted {
        fn classify(&self, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
            self.calls.set(self.calls.get() + 1);
            (self.answer)(request)
        }
    }

    fn all_maintainability(request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
        Ok((0..request.items.len())
            .map(|i| RemoteVerdict {
                span_index: i,
                concept_id: "maintainability".into(),
                confidence: 0.8,
            })
            .collect())
    }

    fn unreachable_service(_: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
        Err(Error::Remote("connection refused".into()))
    }

    fn no_delay(batch_size: usize) -> BatchSettings {
        BatchSettings {
            batch_size,
            delay: Duration::ZERO,
            preview_chars: 500,
        }
    }

    #[test]
    fn test_keyword_short_circuits_remote() {
        let remote = Scripted {
            calls: Cell::new(0),
            answer: all_maintainability,
        };
        let classifier = ConceptClassifier::new(Vocabulary::ddia_chapter_one()).with_remote(&remote, no_delay(20));
        let out = classifier.classify(&[span("Throughput Matters")]);
        assert_eq!(out.classifications[0].concept_id, "scalability");
        assert_eq!(out.classifications[0].confidence, 1.0);
        assert_eq!(remote.calls.get(), 0);
    }

    #[test]
    fn test_remote_resolves_leftovers() {
        let remote = Scripted {
            calls: Cell::new(0),
            answer: all_maintainability,
        };
        let classifier = ConceptClassifier::new(Vocabulary::ddia_chapter_one()).with_remote(&remote, no_delay(20));
        let out = classifier.classify(&[span("Faults"), span("Operations Teams")]);
        assert_eq!(out.classifications[0].method, Method::Keyword);
        assert_eq!(out.classifications[1].method, Method::Remote);
        assert_eq!(out.classifications[1].confidence, 0.8);
        assert_eq!(remote.calls.get(), 1);
    }

    #[test]
    fn test_remote_batches() {
        let remote = Scripted {
            calls: Cell::new(0),
            answer: all_maintainability,
        };
        let spans: Vec<StructuralSpan> = (0..5).map(|i| span(&format!("Topic {i}"))).collect();
        let out = ConceptClassifier::new(Vocabulary::ddia_chapter_one())
            .with_remote(&remote, no_delay(2))
            .classify(&spans);
        assert_eq!(remote.calls.get(), 3);
        assert!(out.classifications.iter().all(|c| c.method == Method::Remote));
    }

    /// Records when each batch arrives.
    struct Clocked {
        calls: std::cell::RefCell<Vec<std::time::Instant>>,
    }

    impl RemoteClassifier for Clocked {
        fn classify(&self, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
            self.calls.borrow_mut().push(std::time::Instant::now());
            all_maintainability(request)
        }
    }

    #[test]
    fn test_delay_between_batches_only() {
        let delay = Duration::from_millis(100);
        let remote = Clocked {
            calls: std::cell::RefCell::new(Vec::new()),
        };
        let settings = BatchSettings {
            batch_size: 1,
            delay,
            preview_chars: 500,
        };
        let spans: Vec<StructuralSpan> = (0..3).map(|i| span(&format!("Topic {i}"))).collect();

        let start = std::time::Instant::now();
        ConceptClassifier::new(Vocabulary::ddia_chapter_one())
            .with_remote(&remote, settings)
            .classify(&spans);
        let elapsed = start.elapsed();

        let calls = remote.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].duration_since(start) < delay, "slept before the first batch");
        for pair in calls.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= delay);
        }
        assert!(elapsed >= delay * 2);
    }

    #[test]
    fn test_single_batch_never_sleeps() {
        let remote = Scripted {
            calls: Cell::new(0),
            answer: all_maintainability,
        };
        let settings = BatchSettings {
            batch_size: 20,
            delay: Duration::from_secs(60),
            preview_chars: 500,
        };
        let spans: Vec<StructuralSpan> = (0..3).map(|i| span(&format!("Topic {i}"))).collect();

        let start = std::time::Instant::now();
        ConceptClassifier::new(Vocabulary::ddia_chapter_one())
            .with_remote(&remote, settings)
            .classify(&spans);
        assert_eq!(remote.calls.get(), 1);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_remote_failure_degrades_to_carry_forward() {
        let remote = Scripted {
            calls: Cell::new(0),
            answer: unreachable_service,
        };
        let out = ConceptClassifier::new(Vocabulary::ddia_chapter_one())
            .with_remote(&remote, no_delay(20))
            .classify(&[span("Preface"), span("Hardware Faults"), span("Operations")]);
        let ids: Vec<&str> = out.classifications.iter().map(|c| c.concept_id.as_str()).collect();
        assert_eq!(ids, ["reliability", "reliability", "reliability"]);
        assert_eq!(out.classifications[0].confidence, CARRY_FORWARD_CONFIDENCE);
        assert_eq!(
            out.warnings,
            vec![Warning::ClassificationUnresolved {
                reason: "remote classifier error: connection refused".into(),
                spans: 2,
            }]
        );
    }

    #[test]
    fn test_carry_forward_follows_nearest_previous() {
        let out = ConceptClassifier::new(Vocabulary::ddia_chapter_one()).classify(&[
            span("Describing Load"),
            span("Twitter Example"),
            span("Operability"),
            span("Closing Remarks"),
        ]);
        let ids: Vec<&str> = out.classifications.iter().map(|c| c.concept_id.as_str()).collect();
        assert_eq!(ids, ["scalability", "scalability", "maintainability", "maintainability"]);
    }

    #[test]
    fn test_no_spans() {
        let out = ConceptClassifier::new(Vocabulary::single("x")).classify(&[]);
        assert!(out.classifications.is_empty());
        assert!(out.warnings.is_empty());
    }
}
