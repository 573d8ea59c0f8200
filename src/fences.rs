//! Normalization of the decision service's validation text.
//!
//! The upstream service produces its verdict with a language model, so the
//! JSON document often arrives wrapped in a markdown code fence. Strip the
//! fence, then decode.

use thiserror::Error;

use crate::models::ValidationOutcome;

const FENCE: &str = "```";

#[derive(Debug, Error)]
#[error("malformed validation response: {0}")]
pub struct MalformedPayload(#[from] serde_json::Error);

/// Removes surrounding code fences (each with an optional language tag such
/// as `json` or `JSON`) and the whitespace around them, until none are left.
/// Applying this twice is the same as applying it once.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    loop {
        let mut next = text;
        if let Some(rest) = next.strip_prefix(FENCE) {
            next = skip_language_tag(rest).trim_start();
        }
        if let Some(rest) = next.strip_suffix(FENCE) {
            next = rest.trim_end();
        }
        if next.len() == text.len() {
            return text;
        }
        text = next;
    }
}

fn skip_language_tag(after_fence: &str) -> &str {
    let tag_len = after_fence
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-')))
        .unwrap_or(after_fence.len());
    let (tag, rest) = after_fence.split_at(tag_len);

    // Only a tag if something that cannot be part of the payload follows it.
    let is_tag = tag.is_empty()
        || rest.is_empty()
        || rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '[');
    if is_tag {
        rest
    } else {
        after_fence
    }
}

pub fn decode_outcome(raw: &str) -> Result<ValidationOutcome, MalformedPayload> {
    Ok(serde_json::from_str(strip_fences(raw))?)
}
