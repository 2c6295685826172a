//! Error types for sectioner.
//!
//! Only configuration problems and collaborator transport failures are
//! errors. Conditions a run can recover from (missing template boundaries,
//! an unreachable classifier, a document with no headings) are reported as
//! [`Warning`](crate::Warning)s instead.

/// Errors that can occur while configuring or running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No vocabulary is configured for the requested document type.
    #[error("no concept vocabulary configured for document type {0:?}")]
    MissingVocabulary(String),

    /// No chapter template is configured under the requested name.
    #[error("no chapter template configured under {0:?}")]
    MissingTemplate(String),

    /// A vocabulary must name at least one concept.
    #[error("concept vocabulary is empty")]
    EmptyVocabulary,

    /// The same concept id appears twice in one vocabulary.
    #[error("duplicate concept id {0:?} in vocabulary")]
    DuplicateConcept(String),

    /// A required credential is absent from the environment.
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    /// A template heading pattern failed to compile.
    #[error("invalid heading pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compiler's complaint.
        #[source]
        source: regex::Error,
    },

    /// Invalid transcript chunk target (must be > 0).
    #[error("invalid chunk target: {0} words (must be > 0)")]
    InvalidChunkTarget(usize),

    /// Input that names no recognizable resource.
    #[error("unrecognized resource identifier {0:?}")]
    InvalidResourceId(String),

    /// Structurally invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The remote classifier could not be reached or answered badly.
    #[error("remote classifier error: {0}")]
    Remote(String),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Reading configuration or input failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for sectioner operations.
pub type Result<T> = std::result::Result<T, Error>;
