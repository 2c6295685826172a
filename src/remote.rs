//! The remote classification collaborator.
//!
//! When keywords fail, span headings and a short content preview are sent to
//! a language model with the closed list of concept ids. The model is asked to
//! answer with JSON:
//!
//! ```text
//! [{"section_index": 0, "concept_id": "reliability", "confidence": 0.9}, ...]
//! ```
//!
//! Models drift from instructions, so [`parse_verdicts`] is lenient about the
//! envelope (a bare array, an object with a `classifications` array, a
//! markdown code fence) and strict about the content (indices must be in
//! range, ids must be in the vocabulary). Items that fail the content checks
//! are dropped one by one; the rest of the reply is still used.
//!
//! The transport is behind the [`RemoteClassifier`] trait. The crate ships an
//! OpenAI-compatible chat-completions client behind the `remote` feature;
//! tests use in-process stubs.

use serde_json::Value;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, Result};

/// Characters of span content sent alongside the heading.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Confidence assumed when the collaborator omits one.
pub const DEFAULT_REMOTE_CONFIDENCE: f64 = 0.5;

/// System message for the chat-completions call.
pub const SYSTEM_PROMPT: &str =
    "You classify text sections into predefined categories. Respond only with valid JSON.";

/// One span as the collaborator sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanPreview {
    /// Span heading.
    pub heading: String,
    /// Leading content, truncated on a grapheme boundary.
    pub preview: String,
}

impl SpanPreview {
    /// Preview the first `max_chars` graphemes of `content`.
    pub fn new(heading: impl Into<String>, content: &str, max_chars: usize) -> Self {
        Self {
            heading: heading.into(),
            preview: truncate_graphemes(content, max_chars).to_string(),
        }
    }
}

/// The longest prefix of `text` holding at most `max` grapheme clusters.
fn truncate_graphemes(text: &str, max: usize) -> &str {
    match text.grapheme_indices(true).nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// A batch of spans to classify against a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    /// Allowed answers.
    pub concept_ids: Vec<String>,
    /// Spans, indexed by position.
    pub items: Vec<SpanPreview>,
}

/// The collaborator's answer for one span.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVerdict {
    /// Index into [`ClassificationRequest::items`].
    pub span_index: usize,
    /// One of [`ClassificationRequest::concept_ids`].
    pub concept_id: String,
    /// In [0, 1].
    pub confidence: f64,
}

/// A remote service that picks concepts for spans.
///
/// Implementations return only verdicts that passed validation; spans
/// without a verdict stay unresolved. An `Err` marks the whole batch as
/// unresolved, never the run as failed.
pub trait RemoteClassifier {
    /// Classify one batch.
    ///
    /// # Errors
    ///
    /// Transport, HTTP status, or response-shape failures.
    fn classify(&self, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>>;
}

impl<T: RemoteClassifier + ?Sized> RemoteClassifier for &T {
    fn classify(&self, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
        (**self).classify(request)
    }
}

impl<T: RemoteClassifier + ?Sized> RemoteClassifier for Box<T> {
    fn classify(&self, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
        (**self).classify(request)
    }
}

/// The user message for a batch.
#[must_use]
pub fn build_prompt(request: &ClassificationRequest) -> String {
    let ids = serde_json::to_string(&request.concept_ids).unwrap_or_else(|_| "[]".to_string());
    let sections: Vec<String> = request
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[Section {i}] {}\n{}", item.heading, item.preview))
        .collect();
    format!(
        "Classify each section into ONE of these concept categories: {ids}\n\n\
         For each section, respond with a JSON array:\n\
         [{{\"section_index\": 0, \"concept_id\": \"{example}\", \"confidence\": 0.9}}, ...]\n\n\
         Only use concept IDs from the list above. If a section doesn't fit any concept, \
         use the most relevant one.\n\n\
         Sections:\n{sections}",
        example = request.concept_ids.first().map_or("concept", String::as_str),
        sections = sections.join("\n"),
    )
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Extract validated verdicts from a collaborator reply.
///
/// # Errors
///
/// [`Error::Json`] if the reply is not JSON at all, [`Error::Remote`] if it
/// is JSON of the wrong shape.
///
/// ```rust
/// use sectioner::{parse_verdicts, ClassificationRequest, SpanPreview};
///
/// let request = ClassificationRequest {
///     concept_ids: vec!["reliability".into(), "scalability".into()],
///     items: vec![SpanPreview::new("Load", "Describing load...", 500)],
/// };
/// let reply = r#"{"classifications": [{"section_index": 0, "concept_id": "scalability"}]}"#;
/// let verdicts = parse_verdicts(reply, &request).unwrap();
///
/// assert_eq!(verdicts[0].concept_id, "scalability");
/// assert_eq!(verdicts[0].confidence, 0.5);
/// ```
pub fn parse_verdicts(reply: &str, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
    let value: Value = serde_json::from_str(strip_code_fence(reply))?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("classifications") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::Remote(
                    "reply object has no \"classifications\" array".to_string(),
                ))
            }
        },
        _ => return Err(Error::Remote("reply is neither an array nor an object".to_string())),
    };

    let verdicts: Vec<RemoteVerdict> = items
        .iter()
        .filter_map(|item| {
            let verdict = parse_item(item, request);
            if verdict.is_none() {
                debug!(%item, "ignoring unusable classification");
            }
            verdict
        })
        .collect();
    Ok(verdicts)
}

fn parse_item(item: &Value, request: &ClassificationRequest) -> Option<RemoteVerdict> {
    let span_index = usize::try_from(item.get("section_index")?.as_u64()?).ok()?;
    if span_index >= request.items.len() {
        return None;
    }
    let concept_id = item.get("concept_id")?.as_str()?;
    if !request.concept_ids.iter().any(|id| id == concept_id) {
        return None;
    }
    let confidence = match item.get("confidence") {
        None | Some(Value::Null) => DEFAULT_REMOTE_CONFIDENCE,
        Some(value) => value.as_f64()?.clamp(0.0, 1.0),
    };
    Some(RemoteVerdict {
        span_index,
        concept_id: concept_id.to_string(),
        confidence,
    })
}

#[cfg(feature = "remote")]
pub use http::OpenAiCompatClassifier;

#[cfg(feature = "remote")]
mod http {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use super::{build_prompt, parse_verdicts, ClassificationRequest, RemoteClassifier, RemoteVerdict, SYSTEM_PROMPT};
    use crate::config::{Credentials, RemoteSettings};
    use crate::{Error, Result};

    /// Chat-completions client for any OpenAI-compatible endpoint.
    #[derive(Debug, Clone)]
    pub struct OpenAiCompatClassifier {
        client: reqwest::blocking::Client,
        base_url: String,
        api_key: String,
        model: String,
    }

    impl OpenAiCompatClassifier {
        /// A client for the given credentials.
        ///
        /// # Errors
        ///
        /// [`Error::Remote`] if the HTTP client cannot be built.
        pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| Error::Remote(e.to_string()))?;
            Ok(Self {
                client,
                base_url: credentials.base_url,
                api_key: credentials.api_key,
                model: credentials.model,
            })
        }

        /// A client configured from settings plus `SECTIONER_*` variables.
        ///
        /// # Errors
        ///
        /// [`Error::MissingCredential`] when no API key is set.
        pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
            Self::new(settings.credentials()?, settings.timeout())
        }

        fn endpoint_chat_completions(&self) -> String {
            format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
        }

        fn chat(&self, system: &str, user: &str) -> Result<String> {
            let req = ChatCompletionsRequest {
                model: self.model.clone(),
                messages: vec![
                    Message {
                        role: "system".to_string(),
                        content: system.to_string(),
                    },
                    Message {
                        role: "user".to_string(),
                        content: user.to_string(),
                    },
                ],
                max_tokens: Some(500),
                temperature: Some(0.1),
                stream: Some(false),
            };

            let resp = self
                .client
                .post(self.endpoint_chat_completions())
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .map_err(|e| Error::Remote(e.to_string()))?;
            let status = resp.status();
            if !status.is_success() {
                return Err(Error::Remote(format!("chat.completions HTTP {status}")));
            }

            let parsed: ChatCompletionsResponse =
                resp.json().map_err(|e| Error::Remote(e.to_string()))?;
            Ok(parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default())
        }
    }

    impl RemoteClassifier for OpenAiCompatClassifier {
        fn classify(&self, request: &ClassificationRequest) -> Result<Vec<RemoteVerdict>> {
            let reply = self.chat(SYSTEM_PROMPT, &build_prompt(request))?;
            parse_verdicts(&reply, request)
        }
    }

    #[derive(Debug, Clone, Serialize)]
    struct ChatCompletionsRequest {
        model: String,
        messages: Vec<Message>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stream: Option<bool>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Message {
        role: String,
        content: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ChatCompletionsResponse {
        #[serde(default)]
        choices: Vec<Choice>,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Choice {
        message: ChoiceMessage,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ChoiceMessage {
        #[serde(default)]
        content: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(n: usize) -> ClassificationRequest {
        ClassificationRequest {
            concept_ids: vec!["reliability".into(), "scalability".into()],
            items: (0..n)
                .map(|i| SpanPreview::new(format!("Heading {i}"), "body", 500))
                .collect(),
        }
    }

    #[test]
    fn test_preview_truncates_on_graphemes() {
        let p = SpanPreview::new("h", "ae\u{301}io", 2);
        assert_eq!(p.preview, "ae\u{301}");
        assert_eq!(SpanPreview::new("h", "short", 500).preview, "short");
    }

    #[test]
    fn test_prompt_lists_ids_and_sections() {
        let prompt = build_prompt(&request(2));
        assert!(prompt.contains(r#"["reliability","scalability"]"#));
        assert!(prompt.contains("[Section 0] Heading 0\nbody"));
        assert!(prompt.contains("[Section 1] Heading 1"));
    }

    #[test]
    fn test_bare_array() {
        let reply = r#"[{"section_index": 1, "concept_id": "reliability", "confidence": 0.9}]"#;
        let v = parse_verdicts(reply, &request(2)).unwrap();
        assert_eq!(
            v,
            vec![RemoteVerdict {
                span_index: 1,
                concept_id: "reliability".into(),
                confidence: 0.9
            }]
        );
    }

    #[test]
    fn test_code_fence() {
        let reply = "```json\n[{\"section_index\": 0, \"concept_id\": \"scalability\"}]\n```";
        let v = parse_verdicts(reply, &request(1)).unwrap();
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_invalid_items_skipped() {
        let reply = r#"[
            {"section_index": 5, "concept_id": "reliability"},
            {"section_index": 0, "concept_id": "security"},
            {"section_index": "zero", "concept_id": "reliability"},
            {"section_index": 0, "concept_id": "reliability", "confidence": 3.0}
        ]"#;
        let v = parse_verdicts(reply, &request(1)).unwrap();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].confidence, 1.0);
    }

    #[test]
    fn test_wrong_shape_is_error() {
        assert!(matches!(
            parse_verdicts(r#"{"answer": []}"#, &request(1)),
            Err(Error::Remote(_))
        ));
        assert!(matches!(parse_verdicts("not json", &request(1)), Err(Error::Json(_))));
    }
}
