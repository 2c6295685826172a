//! Startup configuration.
//!
//! Everything a run needs besides its input: concept vocabularies keyed by
//! document type, chapter templates keyed by name, transcript chunking
//! parameters, and remote-classifier pacing. Loaded once from JSON, then
//! passed by reference; nothing here is global.
//!
//! ```json
//! {
//!   "vocabularies": {
//!     "ddia-ch8": [
//!       {"id": "unreliable-networks", "keywords": ["network", "timeout"]},
//!       {"id": "unreliable-clocks", "keywords": ["clock", "time"]}
//!     ]
//!   },
//!   "transcript": {"target_words": 400},
//!   "remote": {"batch_size": 10, "delay_ms": 1000}
//! }
//! ```
//!
//! Every field is optional. Built-in entries (the DDIA chapter 1 vocabulary
//! and template under `"ddia-ch1"`) are always present unless the file
//! overrides them by name.
//!
//! Credentials never live in the file. They come from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `SECTIONER_API_KEY` | bearer token | required for remote classification |
//! | `SECTIONER_BASE_URL` | OpenAI-compatible endpoint | `remote.base_url`, then DeepSeek |
//! | `SECTIONER_MODEL` | model name | `remote.model`, then `deepseek-chat` |

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::BatchSettings;
use crate::remote::DEFAULT_PREVIEW_CHARS;
use crate::segment::{Segmenter, DEFAULT_FALLBACK_TITLE, DEFAULT_MIN_SPAN_WORDS};
use crate::template::ChapterTemplate;
use crate::transcript::{TranscriptChunker, SILENCE_GAP_SECS};
use crate::vocabulary::Vocabulary;
use crate::{Error, Result};

/// Key of the built-in vocabulary and template.
pub const BUILTIN_DDIA_CHAPTER_ONE: &str = "ddia-ch1";

/// Concept assigned to transcript chunks until they are mapped by hand.
pub const DEFAULT_TRANSCRIPT_CONCEPT: &str = "to-be-mapped";

/// Endpoint used when neither the environment nor the file names one.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Model used when neither the environment nor the file names one.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "SECTIONER_API_KEY";
/// Environment variable overriding the endpoint.
pub const ENV_BASE_URL: &str = "SECTIONER_BASE_URL";
/// Environment variable overriding the model.
pub const ENV_MODEL: &str = "SECTIONER_MODEL";

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Concept vocabularies by document type.
    pub vocabularies: BTreeMap<String, Vocabulary>,
    /// Chapter templates by name.
    pub templates: BTreeMap<String, ChapterTemplate>,
    /// Heading-driven segmentation.
    pub segment: SegmentSettings,
    /// Transcript chunking.
    pub transcript: TranscriptSettings,
    /// Remote classifier pacing and endpoint.
    pub remote: RemoteSettings,
}

impl Config {
    /// Only the built-in entries, default settings everywhere else.
    #[must_use]
    pub fn builtin() -> Self {
        let mut config = Self::default();
        config.add_builtins();
        config
    }

    /// Parse JSON and add the built-in entries it does not override.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] for malformed JSON or an invalid vocabulary.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.add_builtins();
        Ok(config)
    }

    /// Read a JSON file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, otherwise as [`Config::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        debug!(
            path = %path.display(),
            vocabularies = config.vocabularies.len(),
            templates = config.templates.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Read `path` if given, otherwise fall back to [`Config::builtin`].
    ///
    /// # Errors
    ///
    /// As [`Config::load`].
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    fn add_builtins(&mut self) {
        self.vocabularies
            .entry(BUILTIN_DDIA_CHAPTER_ONE.to_string())
            .or_insert_with(Vocabulary::ddia_chapter_one);
        self.templates
            .entry(BUILTIN_DDIA_CHAPTER_ONE.to_string())
            .or_insert_with(ChapterTemplate::ddia_chapter_one);
    }

    /// The vocabulary for a document type.
    ///
    /// # Errors
    ///
    /// [`Error::MissingVocabulary`] if none is configured.
    pub fn vocabulary(&self, doc_type: &str) -> Result<&Vocabulary> {
        self.vocabularies
            .get(doc_type)
            .ok_or_else(|| Error::MissingVocabulary(doc_type.to_string()))
    }

    /// A chapter template by name.
    ///
    /// # Errors
    ///
    /// [`Error::MissingTemplate`] if none is configured.
    pub fn template(&self, name: &str) -> Result<&ChapterTemplate> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::MissingTemplate(name.to_string()))
    }
}

/// Heading-driven segmentation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentSettings {
    /// Spans below this many words are dropped.
    pub min_span_words: usize,
    /// Title of the whole-document fallback span.
    pub fallback_title: String,
}

impl SegmentSettings {
    /// A segmenter with these parameters.
    #[must_use]
    pub fn segmenter(&self) -> Segmenter {
        Segmenter::new()
            .with_min_words(self.min_span_words)
            .with_fallback_title(&self.fallback_title)
    }
}

impl Default for SegmentSettings {
    fn default() -> Self {
        Self {
            min_span_words: DEFAULT_MIN_SPAN_WORDS,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }
}

/// Transcript chunking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Target words per chunk.
    pub target_words: usize,
    /// Seconds of silence that count as a boundary.
    pub silence_gap_secs: f64,
    /// Concept id given to every chunk.
    pub concept_id: String,
}

impl TranscriptSettings {
    /// A chunker with these parameters.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidChunkTarget`] if `target_words` is 0, [`Error::Config`]
    /// if the silence gap is negative or not finite.
    pub fn chunker(&self) -> Result<TranscriptChunker> {
        if !(self.silence_gap_secs.is_finite() && self.silence_gap_secs >= 0.0) {
            return Err(Error::Config(format!(
                "transcript.silence_gap_secs must be a non-negative number (got {})",
                self.silence_gap_secs
            )));
        }
        Ok(TranscriptChunker::new(self.target_words)?.with_silence_gap(self.silence_gap_secs))
    }
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            target_words: 500,
            silence_gap_secs: SILENCE_GAP_SECS,
            concept_id: DEFAULT_TRANSCRIPT_CONCEPT.to_string(),
        }
    }
}

/// Remote classifier endpoint and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Endpoint; `SECTIONER_BASE_URL` wins over this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model; `SECTIONER_MODEL` wins over this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Pause between successive requests.
    pub delay_ms: u64,
    /// Spans per request.
    pub batch_size: usize,
    /// Content characters sent per span.
    pub preview_chars: usize,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            timeout_ms: 30_000,
            delay_ms: 500,
            batch_size: 20,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl RemoteSettings {
    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Batching for the classifier's remote step.
    #[must_use]
    pub fn batch(&self) -> BatchSettings {
        BatchSettings {
            batch_size: self.batch_size,
            delay: Duration::from_millis(self.delay_ms),
            preview_chars: self.preview_chars,
        }
    }

    /// Resolve credentials from the process environment.
    ///
    /// # Errors
    ///
    /// [`Error::MissingCredential`] when `SECTIONER_API_KEY` is unset or blank.
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(env)
    }

    /// Resolve credentials through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// As [`RemoteSettings::credentials`].
    pub fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let api_key = lookup(ENV_API_KEY).ok_or(Error::MissingCredential(ENV_API_KEY))?;
        let base_url = lookup(ENV_BASE_URL)
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = lookup(ENV_MODEL)
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Credentials {
            api_key,
            base_url,
            model,
        })
    }
}

/// What a remote client needs to authenticate.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token.
    pub api_key: String,
    /// Endpoint root.
    pub base_url: String,
    /// Model name.
    pub model: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_builtin_entries() {
        let config = Config::builtin();
        assert!(config.vocabulary(BUILTIN_DDIA_CHAPTER_ONE).is_ok());
        assert!(config.template(BUILTIN_DDIA_CHAPTER_ONE).is_ok());
        assert_eq!(config.transcript.target_words, 500);
        assert_eq!(config.remote.batch_size, 20);
    }

    #[test]
    fn test_missing_entries_are_errors() {
        let config = Config::builtin();
        assert!(matches!(config.vocabulary("ddia-ch9"), Err(Error::MissingVocabulary(t)) if t == "ddia-ch9"));
        assert!(matches!(config.template("nope"), Err(Error::MissingTemplate(_))));
    }

    #[test]
    fn test_file_entries_merge_with_builtins() {
        let json = r#"{
            "vocabularies": {"ddia-ch8": [{"id": "unreliable-networks", "keywords": ["Network"]}]},
            "transcript": {"target_words": 400},
            "remote": {"delay_ms": 0}
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.vocabulary("ddia-ch8").unwrap().concepts()[0].keywords, ["network"]);
        assert!(config.vocabulary(BUILTIN_DDIA_CHAPTER_ONE).is_ok());
        assert_eq!(config.transcript.target_words, 400);
        assert_eq!(config.transcript.silence_gap_secs, 5.0);
        assert_eq!(config.remote.batch().delay, Duration::ZERO);
        assert_eq!(config.remote.timeout_ms, 30_000);
    }

    #[test]
    fn test_file_overrides_builtin_by_name() {
        let json = r#"{"vocabularies": {"ddia-ch1": [{"id": "only"}]}}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.vocabulary("ddia-ch1").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_vocabulary_rejected() {
        assert!(Config::from_json(r#"{"vocabularies": {"x": []}}"#).is_err());
    }

    #[test]
    fn test_credentials_require_api_key() {
        let settings = RemoteSettings::default();
        assert!(matches!(
            settings.credentials_with(vars(&[])),
            Err(Error::MissingCredential(ENV_API_KEY))
        ));
    }

    #[test]
    fn test_credentials_precedence() {
        let settings = RemoteSettings {
            model: Some("from-file".into()),
            ..RemoteSettings::default()
        };
        let creds = settings
            .credentials_with(vars(&[(ENV_API_KEY, "k"), (ENV_BASE_URL, "http://localhost:8080")]))
            .unwrap();
        assert_eq!(creds.base_url, "http://localhost:8080");
        assert_eq!(creds.model, "from-file");
        assert!(format!("{creds:?}").contains("<redacted>"));
    }

    #[test]
    fn test_bad_transcript_settings() {
        let settings = TranscriptSettings {
            target_words: 0,
            ..TranscriptSettings::default()
        };
        assert!(matches!(settings.chunker(), Err(Error::InvalidChunkTarget(0))));
        let settings = TranscriptSettings {
            silence_gap_secs: -1.0,
            ..TranscriptSettings::default()
        };
        assert!(matches!(settings.chunker(), Err(Error::Config(_))));
    }
}
