//! History blob encoding and trimming.
//!
//! A blob is the JSON array of [`Content`] turns in API wire form. The empty
//! string stands for "no history".

use crate::core::errors::AssistantResult;
use crate::llm::types::Content;

/// Serialize a history into a blob.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn encode(history: &[Content]) -> AssistantResult<String> {
    if history.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(history)?)
}

/// Parse a blob back into a history.
///
/// Turns without parts are dropped; the API rejects them.
///
/// # Errors
/// Returns an error if the blob is not a valid serialized history.
pub fn decode(blob: &str) -> AssistantResult<Vec<Content>> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut history: Vec<Content> = serde_json::from_str(blob)?;
    history.retain(|content| !content.parts.is_empty());
    Ok(history)
}

/// Keep at most the last `max_contents` turns.
///
/// The kept history always opens with a user text turn, so no function
/// response is left without its call. When the window holds no user text
/// the newest exchange is kept whole, even if it exceeds the limit.
/// Turns without parts are dropped. `max_contents == 0` keeps everything.
#[must_use]
pub fn trim(mut history: Vec<Content>, max_contents: usize) -> Vec<Content> {
    history.retain(|content| !content.parts.is_empty());
    if max_contents == 0 || history.len() <= max_contents {
        return history;
    }

    let cut = history.len() - max_contents;
    let start = history[cut..]
        .iter()
        .position(Content::is_user_text)
        .map(|offset| cut + offset)
        .or_else(|| history[..cut].iter().rposition(Content::is_user_text))
        .unwrap_or(0);
    history.drain(..start);
    history
}
