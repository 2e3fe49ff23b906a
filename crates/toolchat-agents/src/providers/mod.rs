use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use toolchat_common::{ChatMessage, Result, ToolCallRequest};

use crate::tools::ToolSpec;

pub mod openai;
pub use openai::OpenAiProvider;

/// Trait for chat-completion backends (OpenAI, DeepSeek, Gemini, GitHub Models, ...).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider identifier (e.g. "openai", "deepseek").
    fn provider_id(&self) -> &str;

    /// Send a completion request and return the first choice.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub tools: Vec<ToolSpec>,
    /// `None` when no tools are offered.
    pub tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The provider decides between answering and calling a tool.
    Auto,
}

/// The first choice of a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub model: String,
    pub usage: Option<Usage>,
    pub stop_reason: Option<String>,
}

impl LlmResponse {
    /// Text content, if the provider returned any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}
