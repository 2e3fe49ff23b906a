use std::collections::HashMap;

use crate::registry::ProviderRegistry;

const GENERIC_APOLOGY: &str = "عذراً، حدث خطأ في الاتصال بالذكاء الاصطناعي.";

const BUILTIN_APOLOGIES: &[(&str, &str)] = &[
    (
        "openai",
        "عذراً، حدث خطأ في الاتصال بـ OpenAI. يرجى المحاولة مرة أخرى لاحقاً.",
    ),
    (
        "deepseek",
        "عذراً، حدث خطأ في الاتصال بـ DeepSeek. يرجى المحاولة مرة أخرى لاحقاً.",
    ),
    (
        "gemini",
        "عذراً، حدث خطأ في الاتصال بـ Google Gemini. يرجى المحاولة مرة أخرى لاحقاً.",
    ),
    (
        "github",
        "عذراً، حدث خطأ في الاتصال بـ GitHub Models. يرجى المحاولة مرة أخرى لاحقاً.",
    ),
];

/// Maps a provider id to the apology shown when that provider fails.
/// Total: unknown ids get the generic apology.
#[derive(Debug, Clone)]
pub struct FallbackHandler {
    messages: HashMap<String, String>,
    default_message: String,
}

impl Default for FallbackHandler {
    fn default() -> Self {
        Self {
            messages: BUILTIN_APOLOGIES
                .iter()
                .map(|(id, msg)| (id.to_string(), msg.to_string()))
                .collect(),
            default_message: GENERIC_APOLOGY.to_string(),
        }
    }
}

impl FallbackHandler {
    /// Built-in apologies, overridden by any per-provider message in the registry.
    pub fn from_registry(registry: &ProviderRegistry) -> Self {
        let mut handler = Self::default();
        for provider in registry.providers() {
            if let Some(message) = &provider.fallback_message {
                handler.messages.insert(provider.id.clone(), message.clone());
            }
        }
        handler
    }

    pub fn message_for(&self, provider_id: &str) -> &str {
        self.messages
            .get(provider_id)
            .map(String::as_str)
            .unwrap_or(&self.default_message)
    }
}
