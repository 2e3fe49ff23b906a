use serde::{Deserialize, Serialize};

/// One entry of a conversation, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool calls issued by an assistant message, replayed in follow-up requests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A provider's request to run a named tool with JSON-encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRequest {
    pub id: String,
    pub tool_name: String,
    pub arguments_json: String,
}

impl ChatMessage {
    fn plain(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
            tool_calls: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(ChatRole::Assistant, content)
    }

    /// Assistant turn that requested tool execution instead of answering.
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(ChatRole::Assistant, content.unwrap_or_default())
        }
    }

    /// Result of a tool call, addressed back to the call that produced it.
    pub fn tool_result(call: &ToolCallRequest, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            tool_name: Some(call.tool_name.clone()),
            ..Self::plain(ChatRole::Tool, content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_entry_deserializes_without_optional_fields() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"مرحبا"}"#).unwrap();
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.content, "مرحبا");
        assert!(msg.tool_call_id.is_none());
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn tool_result_echoes_call_identity() {
        let call = ToolCallRequest {
            id: "call_1".into(),
            tool_name: "clone_website".into(),
            arguments_json: "{}".into(),
        };
        let msg = ChatMessage::tool_result(&call, r#"{"success":true}"#);

        assert_eq!(msg.role, ChatRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.tool_name.as_deref(), Some("clone_website"));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["toolCallId"], "call_1");
        assert_eq!(json["toolName"], "clone_website");
        assert!(json.get("toolCalls").is_none());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<ChatMessage>(r#"{"role":"narrator","content":"x"}"#);
        assert!(parsed.is_err());
    }
}
