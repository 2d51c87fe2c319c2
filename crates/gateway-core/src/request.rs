//! Chat completion request envelope.
//!
//! The gateway only ever rewrites a couple of top-level fields of an inbound
//! request (`model`, plus the field dropped by conflict resolution). Everything
//! else, including fields this crate knows nothing about, has to reach the
//! upstream exactly as the client sent it. [`ChatRequest`] therefore keeps the
//! parsed JSON object as its only representation and computes typed views on
//! demand. Object keys keep their original order (`serde_json/preserve_order`).

use crate::error::{GatewayError, GatewayResult};
use crate::route::ConflictResolution;
use crate::truncate::truncate_messages_in_place;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// OpenAI-compatible chat completion request backed by its original JSON object
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    body: Map<String, Value>,
}

impl ChatRequest {
    /// Parse a request from raw bytes
    pub fn from_slice(bytes: &[u8]) -> GatewayResult<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(GatewayError::request_parse)?;
        Self::from_value(value)
    }

    /// Build a request from an already parsed JSON value.
    ///
    /// The value must be an object whose `model`, when present and not null,
    /// is a string.
    pub fn from_value(value: Value) -> GatewayResult<Self> {
        let Value::Object(body) = value else {
            return Err(GatewayError::request_parse("request body must be a JSON object"));
        };

        match body.get("model") {
            None | Some(Value::Null | Value::String(_)) => Ok(Self { body }),
            Some(_) => Err(GatewayError::request_parse("field 'model' must be a string")),
        }
    }

    /// Requested model, or the empty string when absent
    #[must_use]
    pub fn model(&self) -> &str {
        self.body.get("model").and_then(Value::as_str).unwrap_or("")
    }

    /// Replace the `model` value, keeping its position in the document
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.body.insert("model".to_string(), Value::String(model.into()));
    }

    /// Top-level field by name
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Whether a top-level field is present
    #[must_use]
    pub fn contains_field(&self, key: &str) -> bool {
        self.body.contains_key(key)
    }

    /// Remove a top-level field without disturbing the order of the others
    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.body.shift_remove(key)
    }

    /// Drop the field a conflict resolution directive competes against.
    ///
    /// Returns the removed value, if the field was present.
    pub fn apply_conflict_resolution(&mut self, resolution: ConflictResolution) -> Option<Value> {
        resolution
            .competing_field()
            .and_then(|field| self.remove_field(field))
    }

    /// Typed view of `messages`; empty when the field is missing or not an array
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.body
            .get("messages")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Message::from_json).collect())
            .unwrap_or_default()
    }

    /// Whether `messages` is present and is an array
    #[must_use]
    pub fn has_message_array(&self) -> bool {
        matches!(self.body.get("messages"), Some(Value::Array(_)))
    }

    /// Number of entries in `messages`
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.body
            .get("messages")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// The underlying JSON object
    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Serialize to bytes for the upstream call
    pub fn to_vec(&self) -> GatewayResult<Vec<u8>> {
        serde_json::to_vec(&self.body).map_err(GatewayError::request_parse)
    }

    /// Copy of the request with message content truncated for logging
    #[must_use]
    pub fn truncated_for_logging(&self) -> Value {
        let mut copy = self.body.clone();
        if let Some(messages) = copy.get_mut("messages") {
            truncate_messages_in_place(messages);
        }
        Value::Object(copy)
    }
}

impl Serialize for ChatRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Typed view of one entry of `messages`
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Author role; empty when missing or not a string
    pub role: String,
    /// Message content, kept in its original shape
    pub content: MessageContent,
    /// Whether the message carries `tool_calls`
    pub has_tool_calls: bool,
}

impl Message {
    fn from_json(value: &Value) -> Self {
        Self {
            role: value
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            content: MessageContent(value.get("content").cloned().unwrap_or(Value::Null)),
            has_tool_calls: value.get("tool_calls").is_some_and(|v| !v.is_null()),
        }
    }
}

/// Message content: a plain string or an array of content blocks.
///
/// Accessors never fail on well-formed content of the other shape; they return
/// a neutral value instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MessageContent(pub Value);

impl MessageContent {
    /// Whether the content is a plain string
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.0.is_string()
    }

    /// Whether the content is an array of blocks
    #[must_use]
    pub fn is_parts(&self) -> bool {
        self.0.is_array()
    }

    /// Whether the content is absent or null
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.0.is_null()
    }

    /// The string content, or `""` when the content is not a string
    #[must_use]
    pub fn as_text(&self) -> &str {
        self.0.as_str().unwrap_or_default()
    }

    /// The content blocks, or an empty slice when the content is not an array
    #[must_use]
    pub fn as_parts(&self) -> &[Value] {
        self.0.as_array().map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SAMPLE: &str = r#"{"model":"gpt-4","messages":[{"role":"user","content":"Hello"}],"temperature":0.7,"x_future_field":{"nested":[1,2,3]},"stream":false}"#;

    #[test]
    fn test_parse_extracts_model() {
        let request = ChatRequest::from_slice(SAMPLE.as_bytes()).expect("parse");
        assert_eq!(request.model(), "gpt-4");
        assert_eq!(request.message_count(), 1);
    }

    #[test]
    fn test_set_model_preserves_everything_else() {
        let mut request = ChatRequest::from_slice(SAMPLE.as_bytes()).expect("parse");
        request.set_model("gpt-4o-mini");

        let out = String::from_utf8(request.to_vec().expect("serialize")).expect("utf8");
        assert_eq!(out, SAMPLE.replace("\"gpt-4\"", "\"gpt-4o-mini\""));
    }

    #[test]
    fn test_round_trip_without_changes_is_identical() {
        let request = ChatRequest::from_slice(SAMPLE.as_bytes()).expect("parse");
        let out = request.to_vec().expect("serialize");
        assert_eq!(String::from_utf8(out).expect("utf8"), SAMPLE);
    }

    #[test]
    fn test_number_literals_keep_their_text() {
        let input = r#"{"model":"a","temperature":1.0e0,"top_p":0.50,"seed":100000000000000000000,"x":1E2}"#;
        let mut request = ChatRequest::from_slice(input.as_bytes()).expect("parse");
        request.set_model("b");

        let out = String::from_utf8(request.to_vec().expect("serialize")).expect("utf8");
        assert_eq!(
            out,
            r#"{"model":"b","temperature":1.0e0,"top_p":0.50,"seed":100000000000000000000,"x":1E2}"#
        );
    }

    #[test]
    fn test_missing_model_reads_empty() {
        let request = ChatRequest::from_slice(br#"{"messages":[]}"#).expect("parse");
        assert_eq!(request.model(), "");

        let request = ChatRequest::from_slice(br#"{"model":null}"#).expect("parse");
        assert_eq!(request.model(), "");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ChatRequest::from_slice(b"{not json"),
            Err(GatewayError::Parse { target: "request", .. })
        ));
        assert!(ChatRequest::from_slice(b"[1,2]").is_err());
        assert!(ChatRequest::from_slice(br#"{"model":42}"#).is_err());
    }

    #[test]
    fn test_remove_field_keeps_order() {
        let mut request = ChatRequest::from_value(json!({
            "model": "m",
            "tools": [],
            "response_format": {"type": "json_object"},
            "messages": []
        }))
        .expect("parse");

        let removed = request.apply_conflict_resolution(ConflictResolution::RemoveResponseFormat);
        assert_eq!(removed, Some(json!({"type": "json_object"})));

        let keys: Vec<&str> = request.as_object().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["model", "tools", "messages"]);
    }

    #[test]
    fn test_conflict_resolution_variants() {
        let original = ChatRequest::from_value(json!({
            "model": "m",
            "tools": [{"type": "function"}],
            "response_format": {"type": "json_object"},
            "temperature": 0.2
        }))
        .expect("parse");

        let mut keep_tools = original.clone();
        keep_tools.apply_conflict_resolution(ConflictResolution::RemoveResponseFormat);
        assert!(keep_tools.contains_field("tools"));
        assert!(!keep_tools.contains_field("response_format"));
        assert!(keep_tools.contains_field("temperature"));

        let mut keep_format = original.clone();
        keep_format.apply_conflict_resolution(ConflictResolution::RemoveTools);
        assert!(!keep_format.contains_field("tools"));
        assert!(keep_format.contains_field("response_format"));

        let mut untouched = original.clone();
        assert_eq!(untouched.apply_conflict_resolution(ConflictResolution::None), None);
        assert_eq!(untouched, original);
    }

    #[test]
    fn test_message_content_shapes() {
        let request = ChatRequest::from_value(json!({
            "model": "m",
            "messages": [
                {"role": "user", "content": "plain"},
                {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                {"role": "assistant", "tool_calls": [{"id": "call_1"}]}
            ]
        }))
        .expect("parse");

        let messages = request.messages();
        assert_eq!(messages.len(), 3);

        assert!(messages[0].content.is_text());
        assert!(!messages[0].content.is_parts());
        assert_eq!(messages[0].content.as_text(), "plain");
        assert!(messages[0].content.as_parts().is_empty());

        assert!(messages[1].content.is_parts());
        assert_eq!(messages[1].content.as_text(), "");
        assert_eq!(messages[1].content.as_parts().len(), 1);

        assert!(messages[2].content.is_missing());
        assert!(messages[2].has_tool_calls);
        assert_eq!(messages[2].role, "assistant");
    }

    #[test]
    fn test_content_type_preserved_through_serialization() {
        let body = json!({
            "model": "m",
            "messages": [{"role": "user", "content": [{"type": "text", "text": "hi"}]}]
        });
        let request = ChatRequest::from_value(body.clone()).expect("parse");
        let out: Value = serde_json::from_slice(&request.to_vec().expect("serialize")).expect("json");
        assert_eq!(out, body);
    }

    #[test]
    fn test_truncated_projection_is_a_copy() {
        let long = "z".repeat(300);
        let request = ChatRequest::from_value(json!({
            "model": "m",
            "messages": [{"role": "user", "content": long}]
        }))
        .expect("parse");

        let projection = request.truncated_for_logging();
        assert_eq!(projection["messages"][0]["content"].as_str().map(str::len), Some(103));
        assert_eq!(request.messages()[0].content.as_text().len(), 300);
    }

    #[test]
    fn test_serde_integration() {
        let request: ChatRequest = serde_json::from_str(SAMPLE).expect("deserialize");
        assert_eq!(serde_json::to_string(&request).expect("serialize"), SAMPLE);

        let bad: Result<ChatRequest, _> = serde_json::from_str(r#""just a string""#);
        assert!(bad.is_err());
    }
}
