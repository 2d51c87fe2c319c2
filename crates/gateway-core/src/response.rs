//! Chat completion response envelope and the models listing.
//!
//! A [`ChatResponse`] keeps the upstream body byte-for-byte and exposes a
//! read-only summary next to it. The summary exists for logging; callers
//! forwarding the response always get the original bytes back.

use crate::error::{GatewayError, GatewayResult};
use crate::truncate::truncate_content;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;

/// Upstream chat completion response
#[derive(Debug, Clone)]
pub struct ChatResponse {
    raw: Box<RawValue>,
    summary: ResponseSummary,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ResponseSummary {
    #[serde(deserialize_with = "lenient")]
    id: String,
    #[serde(deserialize_with = "lenient")]
    object: String,
    #[serde(deserialize_with = "lenient")]
    created: i64,
    #[serde(deserialize_with = "lenient")]
    model: String,
    #[serde(deserialize_with = "lenient")]
    choices: Vec<Choice>,
    #[serde(deserialize_with = "lenient")]
    usage: Option<Usage>,
}

/// Read a summary field, falling back to its default on `null` or a
/// mismatched type. Only the outer body shape decides whether a call failed.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl ChatResponse {
    /// Parse an upstream body, keeping it verbatim
    pub fn from_slice(bytes: &[u8]) -> GatewayResult<Self> {
        let raw: Box<RawValue> =
            serde_json::from_slice(bytes).map_err(GatewayError::response_parse)?;

        if !raw.get().starts_with('{') {
            return Err(GatewayError::response_parse("response body must be a JSON object"));
        }

        let summary: ResponseSummary =
            serde_json::from_str(raw.get()).map_err(GatewayError::response_parse)?;

        Ok(Self { raw, summary })
    }

    /// Response id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    /// Object type, normally `chat.completion`
    #[must_use]
    pub fn object(&self) -> &str {
        &self.summary.object
    }

    /// Creation timestamp (Unix seconds)
    #[must_use]
    pub fn created(&self) -> i64 {
        self.summary.created
    }

    /// Model reported by the upstream
    #[must_use]
    pub fn model(&self) -> &str {
        &self.summary.model
    }

    /// Completion choices
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.summary.choices
    }

    /// Token usage, when reported
    #[must_use]
    pub fn usage(&self) -> Option<&Usage> {
        self.summary.usage.as_ref()
    }

    /// The verbatim upstream body
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.raw.get()
    }

    /// The verbatim upstream body as bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.get().as_bytes()
    }

    /// Copy of the body with `choices[*].message.content` truncated for logging
    #[must_use]
    pub fn truncated_for_logging(&self) -> Value {
        let mut copy: Value = serde_json::from_str(self.raw.get()).unwrap_or(Value::Null);

        if let Some(Value::Array(choices)) = copy.get_mut("choices") {
            for choice in choices {
                if let Some(content) = choice
                    .get_mut("message")
                    .and_then(|message| message.get_mut("content"))
                {
                    *content = truncate_content(content);
                }
            }
        }

        copy
    }
}

impl Serialize for ChatResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// One completion choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Choice {
    /// Choice index
    #[serde(deserialize_with = "lenient")]
    pub index: u32,
    /// Generated message
    #[serde(deserialize_with = "lenient")]
    pub message: ResponseMessage,
    /// Why generation stopped
    #[serde(deserialize_with = "lenient")]
    pub finish_reason: Option<String>,
}

/// Message inside a choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseMessage {
    /// Author role
    #[serde(deserialize_with = "lenient")]
    pub role: String,
    /// Content, a string, an array of blocks, or null
    pub content: Value,
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Prompt tokens
    #[serde(deserialize_with = "lenient")]
    pub prompt_tokens: u32,
    /// Completion tokens
    #[serde(deserialize_with = "lenient")]
    pub completion_tokens: u32,
    /// Total tokens
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u32,
}

/// Entry of `GET /v1/models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelObject {
    /// Model id (a route name)
    pub id: String,
    /// Always `model`
    pub object: String,
    /// Creation timestamp
    pub created: i64,
    /// Owner
    pub owned_by: String,
}

impl ModelObject {
    /// Fixed timestamp reported for every route-backed model
    pub const CREATED: i64 = 1_677_610_602;

    /// Create a model entry owned by the gateway
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created: Self::CREATED,
            owned_by: "ai-gateway".to_string(),
        }
    }
}

/// Body of `GET /v1/models`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    /// Always `list`
    pub object: String,
    /// Models
    pub data: Vec<ModelObject>,
}

impl ModelsResponse {
    /// Build a list response
    #[must_use]
    pub fn new(data: Vec<ModelObject>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}
