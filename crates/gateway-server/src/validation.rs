//! Chat completion request validation.

use gateway_core::{ChatRequest, Message};
use thiserror::Error;

/// Roles accepted in `messages`
pub const VALID_ROLES: [&str; 4] = ["system", "user", "assistant", "tool"];

/// Reason a chat completion request was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `model` missing or empty
    #[error("model is required")]
    MissingModel,

    /// `messages` missing, not an array, or empty
    #[error("messages array is required and cannot be empty")]
    MissingMessages,

    /// Message without a role
    #[error("message[{index}]: role is required")]
    MissingRole {
        /// Message position
        index: usize,
    },

    /// Message with an unknown role
    #[error("message[{index}]: invalid role '{role}', must be one of: system, user, assistant, tool")]
    InvalidRole {
        /// Message position
        index: usize,
        /// Role as sent
        role: String,
    },

    /// Message with blank or empty content
    #[error("message[{index}]: content is required")]
    MissingContent {
        /// Message position
        index: usize,
    },

    /// Content that is neither a string nor an array of parts
    #[error("message[{index}]: content must be a string or an array of content parts")]
    InvalidContent {
        /// Message position
        index: usize,
    },
}

/// Check the fields the gateway relies on. Everything else is forwarded as-is.
pub fn validate_chat_request(request: &ChatRequest) -> Result<(), ValidationError> {
    if request.model().trim().is_empty() {
        return Err(ValidationError::MissingModel);
    }

    if !request.has_message_array() || request.message_count() == 0 {
        return Err(ValidationError::MissingMessages);
    }

    for (index, message) in request.messages().iter().enumerate() {
        validate_message(index, message)?;
    }

    Ok(())
}

fn validate_message(index: usize, message: &Message) -> Result<(), ValidationError> {
    let role = message.role.trim();
    if role.is_empty() {
        return Err(ValidationError::MissingRole { index });
    }
    if !VALID_ROLES.contains(&message.role.as_str()) {
        return Err(ValidationError::InvalidRole {
            index,
            role: message.role.clone(),
        });
    }

    // Assistant turns that only call tools carry no content.
    if message.role == "assistant" && message.has_tool_calls {
        return Ok(());
    }

    let content = &message.content;
    if content.is_missing() {
        return Err(ValidationError::MissingContent { index });
    }
    if content.is_text() {
        if content.as_text().trim().is_empty() {
            return Err(ValidationError::MissingContent { index });
        }
    } else if content.is_parts() {
        if content.as_parts().is_empty() {
            return Err(ValidationError::MissingContent { index });
        }
    } else {
        return Err(ValidationError::InvalidContent { index });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn check(body: Value) -> Result<(), ValidationError> {
        validate_chat_request(&ChatRequest::from_value(body).expect("object"))
    }

    #[test]
    fn test_valid_requests() {
        assert_eq!(
            check(json!({
                "model": "smart",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": [{"type": "text", "text": "hi"}]},
                    {"role": "assistant", "tool_calls": [{"id": "call_1"}]},
                    {"role": "tool", "tool_call_id": "call_1", "content": "42"}
                ]
            })),
            Ok(())
        );
    }

    #[test]
    fn test_model_required() {
        assert_eq!(check(json!({"messages": [{"role": "user", "content": "x"}]})), Err(ValidationError::MissingModel));
        assert_eq!(
            check(json!({"model": "  ", "messages": [{"role": "user", "content": "x"}]})),
            Err(ValidationError::MissingModel)
        );
    }

    #[test]
    fn test_messages_required() {
        for messages in [json!(null), json!([]), json!("hi"), json!({"role": "user"})] {
            assert_eq!(
                check(json!({"model": "m", "messages": messages})),
                Err(ValidationError::MissingMessages)
            );
        }
        assert_eq!(check(json!({"model": "m"})), Err(ValidationError::MissingMessages));
    }

    #[test]
    fn test_role_checks_name_the_index() {
        let err = check(json!({
            "model": "m",
            "messages": [{"role": "user", "content": "ok"}, {"content": "no role"}]
        }))
        .expect_err("missing role");
        assert_eq!(err, ValidationError::MissingRole { index: 1 });
        assert_eq!(err.to_string(), "message[1]: role is required");

        let err = check(json!({"model": "m", "messages": [{"role": "robot", "content": "beep"}]}))
            .expect_err("bad role");
        assert_eq!(
            err.to_string(),
            "message[0]: invalid role 'robot', must be one of: system, user, assistant, tool"
        );
    }

    #[test]
    fn test_content_checks() {
        let cases = [
            (json!({"role": "user"}), ValidationError::MissingContent { index: 0 }),
            (json!({"role": "user", "content": "   "}), ValidationError::MissingContent { index: 0 }),
            (json!({"role": "user", "content": []}), ValidationError::MissingContent { index: 0 }),
            (json!({"role": "user", "content": 7}), ValidationError::InvalidContent { index: 0 }),
            (json!({"role": "assistant", "content": ""}), ValidationError::MissingContent { index: 0 }),
        ];

        for (message, expected) in cases {
            assert_eq!(check(json!({"model": "m", "messages": [message]})), Err(expected));
        }
    }

    #[test]
    fn test_tool_calls_exemption_only_applies_to_assistant() {
        assert_eq!(
            check(json!({"model": "m", "messages": [{"role": "assistant", "content": null, "tool_calls": [{}]}]})),
            Ok(())
        );
        assert_eq!(
            check(json!({"model": "m", "messages": [{"role": "user", "tool_calls": [{}]}]})),
            Err(ValidationError::MissingContent { index: 0 })
        );
    }
}
