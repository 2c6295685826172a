//! Resource identifiers.
//!
//! Every section carries the id of the resource it came from. Ids are
//! derived from the source's own identifier with a type prefix:
//! `arxiv-2005.11401`, `youtube-dQw4w9WgXcQ`.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

static RE_YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?.*?\bv=|embed/|live/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("valid youtube url regex")
});
static RE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id regex"));
static RE_ARXIV_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:arxiv:|(?:https?://)?(?:www\.)?arxiv\.org/(?:abs|pdf)/)").expect("valid arxiv prefix regex")
});

/// The 11-character video id from a YouTube URL or a bare id.
///
/// # Errors
///
/// [`Error::InvalidResourceId`] when no id can be found.
///
/// ```rust
/// use sectioner::youtube_video_id;
///
/// assert_eq!(youtube_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
/// assert_eq!(youtube_video_id("dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
/// assert!(youtube_video_id("not a video").is_err());
/// ```
pub fn youtube_video_id(url_or_id: &str) -> Result<String> {
    let input = url_or_id.trim();
    if let Some(caps) = RE_YOUTUBE_URL.captures(input) {
        return Ok(caps[1].to_string());
    }
    if RE_VIDEO_ID.is_match(input) {
        return Ok(input.to_string());
    }
    Err(Error::InvalidResourceId(input.to_string()))
}

/// `youtube-{video_id}`.
///
/// # Errors
///
/// As [`youtube_video_id`].
pub fn youtube_resource_id(url_or_id: &str) -> Result<String> {
    Ok(format!("youtube-{}", youtube_video_id(url_or_id)?))
}

/// `arxiv-{id}`, with `/` in old-style ids replaced by `-`.
///
/// Accepts bare ids, `arXiv:` prefixes, and abs/pdf URLs.
///
/// ```rust
/// use sectioner::arxiv_resource_id;
///
/// assert_eq!(arxiv_resource_id("2005.11401"), "arxiv-2005.11401");
/// assert_eq!(arxiv_resource_id("hep-th/9901001"), "arxiv-hep-th-9901001");
/// assert_eq!(arxiv_resource_id("https://arxiv.org/abs/1706.03762"), "arxiv-1706.03762");
/// ```
#[must_use]
pub fn arxiv_resource_id(paper_id: &str) -> String {
    let id = RE_ARXIV_PREFIX.replace(paper_id.trim(), "");
    let id = id.trim_end_matches(".pdf").trim_end_matches('/');
    format!("arxiv-{}", id.replace('/', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=30",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
            "https://m.youtube.com/shorts/dQw4w9WgXcQ",
            "  https://youtu.be/dQw4w9WgXcQ  ",
        ] {
            assert_eq!(youtube_video_id(url).unwrap(), "dQw4w9WgXcQ", "{url}");
        }
    }

    #[test]
    fn test_bad_youtube_ids() {
        assert!(matches!(youtube_video_id("short"), Err(Error::InvalidResourceId(_))));
        assert!(youtube_video_id("https://vimeo.com/123456789").is_err());
    }

    #[test]
    fn test_youtube_resource_id() {
        assert_eq!(youtube_resource_id("dQw4w9WgXcQ").unwrap(), "youtube-dQw4w9WgXcQ");
    }

    #[test]
    fn test_arxiv_prefixes() {
        assert_eq!(arxiv_resource_id("arXiv:2005.11401"), "arxiv-2005.11401");
        assert_eq!(arxiv_resource_id("https://arxiv.org/pdf/2005.11401.pdf"), "arxiv-2005.11401");
        assert_eq!(arxiv_resource_id("2005.11401v2"), "arxiv-2005.11401v2");
    }
}
