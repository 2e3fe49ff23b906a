use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use toolchat_common::{ChatMessage, ChatRole, Error, Result, ToolCallRequest};
use tracing::debug;

use crate::providers::{LlmProvider, LlmRequest, LlmResponse, ToolChoice, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for any backend that speaks the OpenAI `/chat/completions` protocol.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    name: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            client: Client::new(),
            api_key,
            base_url,
            name: "openai".to_string(),
        }
    }

    /// Report a different provider id, for OpenAI-compatible vendors.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn provider_id(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = convert_request(request);
        debug!(
            provider = %self.name,
            messages = body.messages.len(),
            tools = body.tools.as_ref().map_or(0, Vec::len),
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("{} request failed: {e}", self.name)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "{} API error (status={}): {}",
                self.name,
                status.as_u16(),
                error_text
            )));
        }

        let parsed: OpenAiResponse = response.json().await.map_err(|e| {
            Error::Provider(format!("failed to parse {} response: {e}", self.name))
        })?;

        Ok(convert_response(parsed))
    }
}

fn convert_request(request: &LlmRequest) -> OpenAiRequest {
    let messages = request.messages.iter().map(convert_message).collect();

    let tools = (!request.tools.is_empty()).then(|| {
        request
            .tools
            .iter()
            .map(|t| OpenAiTool {
                kind: "function",
                function: OpenAiFunctionDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                    strict: t.strict,
                },
            })
            .collect()
    });

    let tool_choice = match (&tools, request.tool_choice) {
        (Some(_), Some(ToolChoice::Auto)) => Some("auto"),
        _ => None,
    };

    OpenAiRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        tools,
        tool_choice,
    }
}

fn convert_message(msg: &ChatMessage) -> OpenAiMessage {
    match msg.role {
        ChatRole::System => OpenAiMessage::System {
            content: msg.content.clone(),
        },
        ChatRole::User => OpenAiMessage::User {
            content: msg.content.clone(),
        },
        ChatRole::Assistant => {
            let tool_calls: Vec<OpenAiToolCall> = msg
                .tool_calls
                .iter()
                .map(|call| OpenAiToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: OpenAiFunctionCall {
                        name: call.tool_name.clone(),
                        arguments: call.arguments_json.clone(),
                    },
                })
                .collect();
            // Tool-calling turns may legitimately carry no text.
            let content = if msg.content.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(msg.content.clone())
            };
            OpenAiMessage::Assistant {
                content,
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            }
        }
        ChatRole::Tool => OpenAiMessage::Tool {
            tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
            name: msg.tool_name.clone(),
            content: msg.content.clone(),
        },
    }
}

fn convert_response(response: OpenAiResponse) -> LlmResponse {
    let usage = response.usage.map(|u| Usage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    let Some(choice) = response.choices.into_iter().next() else {
        return LlmResponse {
            model: response.model,
            usage,
            ..LlmResponse::default()
        };
    };

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCallRequest {
            id: tc.id,
            tool_name: tc.function.name,
            arguments_json: tc.function.arguments,
        })
        .collect();

    LlmResponse {
        content: choice.message.content,
        tool_calls,
        model: response.model,
        usage,
        stop_reason: choice.finish_reason,
    }
}

// Request types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum OpenAiMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<OpenAiToolCall>>,
    },
    Tool {
        tool_call_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        content: String,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OpenAiFunctionDefinition,
}

#[derive(Serialize)]
struct OpenAiFunctionDefinition {
    name: String,
    description: String,
    parameters: serde_json::Value,
    strict: bool,
}

// Response types
#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;

    #[test]
    fn request_without_tools_omits_tool_choice() {
        let request = LlmRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            max_tokens: Some(1000),
            temperature: Some(0.7),
            tools: Vec::new(),
            tool_choice: Some(ToolChoice::Auto),
        };
        let json = serde_json::to_value(convert_request(&request)).unwrap();

        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn tools_are_sent_as_strict_functions() {
        let registry = ToolRegistry::builtin();
        let request = LlmRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::user("clone example.com")],
            max_tokens: None,
            temperature: None,
            tools: registry.list_tools().to_vec(),
            tool_choice: Some(ToolChoice::Auto),
        };
        let json = serde_json::to_value(convert_request(&request)).unwrap();

        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "clone_website");
        assert_eq!(json["tools"][0]["function"]["strict"], true);
        assert_eq!(
            json["tools"][0]["function"]["parameters"]["additionalProperties"],
            false
        );
    }

    #[test]
    fn assistant_tool_call_and_tool_result_round_out_follow_up() {
        let call = ToolCallRequest {
            id: "call_9".into(),
            tool_name: "clone_website".into(),
            arguments_json: r#"{"url":"https://example.com"}"#.into(),
        };
        let assistant = convert_message(&ChatMessage::assistant_tool_calls(None, vec![call.clone()]));
        let tool = convert_message(&ChatMessage::tool_result(&call, "{}"));

        let assistant = serde_json::to_value(assistant).unwrap();
        assert!(assistant["content"].is_null());
        assert_eq!(assistant["tool_calls"][0]["id"], "call_9");
        assert_eq!(
            assistant["tool_calls"][0]["function"]["arguments"],
            r#"{"url":"https://example.com"}"#
        );

        let tool = serde_json::to_value(tool).unwrap();
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_9");
        assert_eq!(tool["name"], "clone_website");
    }

    #[test]
    fn empty_choices_yield_empty_response() {
        let response: OpenAiResponse =
            serde_json::from_str(r#"{"model":"gpt-4","choices":[]}"#).unwrap();
        let converted = convert_response(response);
        assert!(converted.content.is_none());
        assert!(converted.tool_calls.is_empty());
        assert!(converted.text().is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider =
            OpenAiProvider::new("k".into(), Some("https://api.deepseek.com/".into())).with_name("deepseek");
        assert_eq!(provider.base_url, "https://api.deepseek.com");
        assert_eq!(provider.provider_id(), "deepseek");
    }
}
