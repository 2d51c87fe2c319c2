//! Logging-safe projections of message content.
//!
//! Every function here works on copies; nothing in this module touches the
//! value returned by ordinary request/response accessors.

use serde_json::Value;
use std::borrow::Cow;

/// Maximum number of characters kept from a piece of content
pub const MAX_CONTENT_CHARS: usize = 100;

/// Appended to content that was cut
pub const TRUNCATION_MARKER: &str = "...";

/// Truncate text to [`MAX_CONTENT_CHARS`] characters plus [`TRUNCATION_MARKER`].
///
/// Text at or under the limit is returned unchanged.
#[must_use]
pub fn truncate_text(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        None => Cow::Borrowed(text),
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
    }
}

/// Truncate message content, which is either a string or an array of blocks.
///
/// For arrays, the `text` field of every `{"type": "text"}` block is truncated
/// and all other blocks pass through. Any other shape is returned as-is.
#[must_use]
pub fn truncate_content(content: &Value) -> Value {
    match content {
        Value::String(s) => Value::String(truncate_text(s).into_owned()),
        Value::Array(blocks) => Value::Array(blocks.iter().map(truncate_block).collect()),
        other => other.clone(),
    }
}

fn truncate_block(block: &Value) -> Value {
    let mut block = block.clone();
    if let Value::Object(map) = &mut block {
        let is_text = map.get("type").and_then(Value::as_str) == Some("text");
        if is_text {
            if let Some(Value::String(text)) = map.get_mut("text") {
                let cut = truncate_text(text).into_owned();
                *text = cut;
            }
        }
    }
    block
}

/// Truncate the `content` of every message object in an array, in place.
pub(crate) fn truncate_messages_in_place(messages: &mut Value) {
    if let Value::Array(items) = messages {
        for item in items {
            if let Some(content) = item.get_mut("content") {
                *content = truncate_content(content);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_text_unchanged() {
        let text = "a".repeat(MAX_CONTENT_CHARS);
        assert!(matches!(truncate_text(&text), Cow::Borrowed(_)));
        assert_eq!(truncate_text("hello"), "hello");
        assert_eq!(truncate_text(""), "");
    }

    #[test]
    fn test_long_text_cut_to_limit_plus_marker() {
        let text = "b".repeat(MAX_CONTENT_CHARS + 1);
        let cut = truncate_text(&text);
        assert_eq!(cut.len(), MAX_CONTENT_CHARS + TRUNCATION_MARKER.len());
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(&cut[..MAX_CONTENT_CHARS], &text[..MAX_CONTENT_CHARS]);
    }

    #[test]
    fn test_multibyte_text_cut_on_char_boundary() {
        let text = "é".repeat(150);
        let cut = truncate_text(&text);
        assert_eq!(cut.chars().count(), MAX_CONTENT_CHARS + TRUNCATION_MARKER.len());
        assert!(cut.starts_with("éé"));
    }

    #[test]
    fn test_array_content_truncates_text_blocks_only() {
        let long = "x".repeat(250);
        let content = json!([
            {"type": "text", "text": long},
            {"type": "image_url", "image_url": {"url": long}},
            {"type": "text", "text": "short"}
        ]);

        let cut = truncate_content(&content);
        let cut_text = cut[0]["text"].as_str().expect("text");
        assert_eq!(cut_text.len(), MAX_CONTENT_CHARS + TRUNCATION_MARKER.len());
        assert_eq!(cut[0]["type"], "text");
        assert_eq!(cut[1]["image_url"]["url"].as_str().map(str::len), Some(250));
        assert_eq!(cut[2]["text"], "short");

        // Source value untouched
        assert_eq!(content[0]["text"].as_str().map(str::len), Some(250));
    }

    #[test]
    fn test_other_shapes_pass_through() {
        assert_eq!(truncate_content(&Value::Null), Value::Null);
        assert_eq!(truncate_content(&json!(42)), json!(42));
        assert_eq!(truncate_content(&json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_truncate_messages_in_place() {
        let mut messages = json!([
            {"role": "user", "content": "y".repeat(120), "name": "bob"},
            {"role": "assistant", "tool_calls": []}
        ]);

        truncate_messages_in_place(&mut messages);

        assert!(messages[0]["content"].as_str().expect("string").ends_with("..."));
        assert_eq!(messages[0]["name"], "bob");
        assert!(messages[1].get("content").is_none());
    }
}
