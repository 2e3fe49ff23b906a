use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use toolchat_common::{ChatMessage, Error, Result, ToolCallRequest};
use toolchat_config::ChatConfig;
use tracing::{info, instrument, warn};

use crate::conversation::ConversationBuilder;
use crate::fallback::FallbackHandler;
use crate::providers::{LlmProvider, LlmRequest, OpenAiProvider, ToolChoice};
use crate::registry::{ProviderConfig, ProviderRegistry};
use crate::tools::{ToolExecutor, ToolRegistry, ToolResultEnvelope};

pub const INVALID_MESSAGE: &str = "Invalid message";
pub const INVALID_PROVIDER: &str = "Invalid AI provider";

const NO_RESPONSE_PLACEHOLDER: &str = "عذراً، لم أتمكن من توليد استجابة مناسبة.";
const TOOL_DONE_PLACEHOLDER: &str = "تم تنفيذ أداة نسخ الموقع بنجاح.";

/// One user turn addressed to a provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub provider_id: String,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResultEnvelope>,
    /// Set when `response` is an apology standing in for a failed provider call.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    pub timestamp: DateTime<Utc>,
}

/// Final answer of a turn that reached a provider successfully.
struct TurnOutcome {
    response: String,
    tool_used: Option<String>,
    tool_result: Option<ToolResultEnvelope>,
}

/// Runs a user turn: first completion with tools offered, at most one tool
/// execution, a tools-free follow-up completion, and a soft fallback when any
/// provider call fails.
pub struct CompletionOrchestrator {
    providers: Arc<ProviderRegistry>,
    tools: Arc<ToolRegistry>,
    executor: ToolExecutor,
    clients: HashMap<String, Arc<dyn LlmProvider>>,
    conversation: ConversationBuilder,
    fallback: FallbackHandler,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl CompletionOrchestrator {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        tools: Arc<ToolRegistry>,
        executor: ToolExecutor,
    ) -> Self {
        let fallback = FallbackHandler::from_registry(&providers);
        let chat = ChatConfig::default();
        Self {
            providers,
            tools,
            executor,
            clients: HashMap::new(),
            conversation: ConversationBuilder::new(chat.history_limit),
            fallback,
            temperature: Some(chat.temperature),
            max_tokens: Some(chat.max_tokens),
        }
    }

    pub fn with_chat_config(mut self, chat: &ChatConfig) -> Self {
        self.conversation = ConversationBuilder::new(chat.history_limit);
        self.temperature = Some(chat.temperature);
        self.max_tokens = Some(chat.max_tokens);
        self
    }

    /// Attach the completion client serving `provider.provider_id()`.
    pub fn register_client(&mut self, provider: Arc<dyn LlmProvider>) {
        let id = provider.provider_id().to_string();
        info!("registered completion client: {}", id);
        self.clients.insert(id, provider);
    }

    /// Create an OpenAI-compatible client for every provider that has a credential.
    pub fn connect_configured_providers(&mut self) {
        let configured: Vec<(String, String, String)> = self
            .providers
            .providers()
            .iter()
            .filter_map(|p| {
                p.credential
                    .clone()
                    .filter(|_| p.has_credential())
                    .map(|key| (p.id.clone(), key, p.base_url.clone()))
            })
            .collect();

        for (id, key, base_url) in configured {
            let client = OpenAiProvider::new(key, Some(base_url)).with_name(id);
            self.register_client(Arc::new(client));
        }
    }

    pub fn providers(&self) -> &Arc<ProviderRegistry> {
        &self.providers
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Check the request before any provider is contacted.
    pub fn validate<'a>(&'a self, request: &ChatRequest) -> Result<&'a ProviderConfig> {
        if request.message.trim().is_empty() {
            return Err(Error::Validation(INVALID_MESSAGE.to_string()));
        }
        self.providers
            .resolve(&request.provider_id)
            .ok_or_else(|| Error::Validation(INVALID_PROVIDER.to_string()))
    }

    /// Handle one turn. Only validation failures are returned as `Err`;
    /// provider failures become an apology with `error: true`.
    #[instrument(skip(self, request), fields(provider_id = %request.provider_id))]
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse> {
        let provider = self.validate(&request)?;

        match self.run_turn(provider, &request).await {
            Ok(outcome) => Ok(ChatResponse {
                success: true,
                response: outcome.response,
                provider_id: provider.id.clone(),
                tool_used: outcome.tool_used,
                tool_result: outcome.tool_result,
                error: false,
                timestamp: Utc::now(),
            }),
            Err(err) => {
                warn!("provider '{}' failed, answering with fallback: {}", provider.id, err);
                Ok(ChatResponse {
                    success: true,
                    response: self.fallback.message_for(&provider.id).to_string(),
                    provider_id: provider.id.clone(),
                    tool_used: None,
                    tool_result: None,
                    error: true,
                    timestamp: Utc::now(),
                })
            }
        }
    }

    async fn run_turn(&self, provider: &ProviderConfig, request: &ChatRequest) -> Result<TurnOutcome> {
        let client = self.clients.get(&provider.id).ok_or_else(|| {
            Error::Provider(format!("no credential configured for provider '{}'", provider.id))
        })?;

        let messages = self
            .conversation
            .build(provider, &request.history, &request.message);

        let first = client
            .complete(&LlmRequest {
                model: provider.model_name.clone(),
                messages: messages.clone(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                tools: self.tools.list_tools().to_vec(),
                tool_choice: Some(ToolChoice::Auto),
            })
            .await?;

        let Some(call) = select_tool_call(first.tool_calls.clone()) else {
            let response = first.text().unwrap_or(NO_RESPONSE_PLACEHOLDER).to_string();
            return Ok(TurnOutcome {
                response,
                tool_used: None,
                tool_result: None,
            });
        };

        info!(tool = %call.tool_name, call_id = %call.id, "provider requested tool");
        let envelope = self
            .executor
            .execute(&call.tool_name, &call.arguments_json)
            .await;

        let mut follow_up = messages;
        follow_up.push(ChatMessage::assistant_tool_calls(
            first.content.clone(),
            vec![call.clone()],
        ));
        follow_up.push(ChatMessage::tool_result(&call, envelope.to_json_string()));

        let second = client
            .complete(&LlmRequest {
                model: provider.model_name.clone(),
                messages: follow_up,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                tools: Vec::new(),
                tool_choice: None,
            })
            .await?;

        let response = second.text().unwrap_or(TOOL_DONE_PLACEHOLDER).to_string();
        Ok(TurnOutcome {
            response,
            tool_used: Some(call.tool_name),
            tool_result: Some(envelope),
        })
    }
}

/// Only the first tool call of a turn is executed; any others are discarded.
pub fn select_tool_call(calls: Vec<ToolCallRequest>) -> Option<ToolCallRequest> {
    let mut calls = calls.into_iter();
    let first = calls.next()?;
    let discarded: Vec<String> = calls.map(|c| format!("{}({})", c.tool_name, c.id)).collect();
    if !discarded.is_empty() {
        warn!(
            kept = %first.id,
            "provider requested {} extra tool call(s), ignoring: {}",
            discarded.len(),
            discarded.join(", ")
        );
    }
    Some(first)
}
