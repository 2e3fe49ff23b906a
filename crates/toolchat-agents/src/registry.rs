use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use toolchat_config::ProviderOverride;
use tracing::{debug, warn};

const KEY_NOT_CONFIGURED: &str = "API key not configured";

/// Prompt for providers added from config without a `system_prompt`.
const DEFAULT_SYSTEM_PROMPT: &str =
    "أنت مساعد ذكاء اصطناعي مفيد. أجب باللغة العربية بطريقة واضحة واحترافية.";

/// Static description of one completion provider. Identity is by `id`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: String,
    pub display_name: String,
    /// Environment variable the credential was read from.
    pub credential_env: String,
    #[serde(skip)]
    pub credential: Option<String>,
    pub model_name: String,
    pub base_url: String,
    pub system_prompt: String,
    #[serde(skip)]
    pub fallback_message: Option<String>,
}

impl ProviderConfig {
    pub fn has_credential(&self) -> bool {
        self.credential.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("credential_env", &self.credential_env)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("system_prompt", &self.system_prompt)
            .field("fallback_message", &self.fallback_message)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

struct BuiltinProvider {
    id: &'static str,
    display_name: &'static str,
    env: &'static str,
    model: &'static str,
    base_url: &'static str,
    system_prompt: &'static str,
}

const BUILTIN_PROVIDERS: &[BuiltinProvider] = &[
    BuiltinProvider {
        id: "openai",
        display_name: "OpenAI GPT",
        env: "OPENAI_API_KEY",
        model: "gpt-4",
        base_url: "https://api.openai.com/v1",
        system_prompt: "أنت مساعد ذكاء اصطناعي سيبراني محترف. أجب باللغة العربية بطريقة احترافية ومفيدة. لديك القدرة على استخدام أدوات متقدمة مثل نسخ المواقع الإلكترونية.",
    },
    BuiltinProvider {
        id: "deepseek",
        display_name: "DeepSeek",
        env: "DEEPSEEK_API_KEY",
        model: "deepseek-chat",
        base_url: "https://api.deepseek.com",
        system_prompt: "أنت مساعد ذكاء اصطناعي متقدم من DeepSeek. أجب باللغة العربية بدقة واحترافية. لديك أدوات متقدمة للمساعدة في المهام التقنية.",
    },
    BuiltinProvider {
        id: "gemini",
        display_name: "Google Gemini",
        env: "GOOGLE_GENERATIVE_AI_API_KEY",
        model: "gemini-pro",
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        system_prompt: "أنت مساعد ذكاء اصطناعي من Google Gemini. أجب باللغة العربية بطريقة واضحة ومفيدة. يمكنك استخدام أدوات متقدمة للمساعدة.",
    },
    BuiltinProvider {
        id: "github",
        display_name: "GitHub Models",
        env: "GITHUB_API_KEY",
        model: "gpt-4",
        base_url: "https://models.inference.ai.azure.com",
        system_prompt: "أنت مساعد ذكاء اصطناعي من GitHub Models. أجب باللغة العربية بطريقة احترافية. لديك وصول لأدوات متقدمة للمطورين.",
    },
];

/// Process-wide, read-only table of providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    /// Built-in providers plus config overrides, with credentials read from the process environment.
    pub fn from_env(overrides: &BTreeMap<String, ProviderOverride>) -> Self {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`ProviderRegistry::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(overrides: &BTreeMap<String, ProviderOverride>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut providers: Vec<ProviderConfig> = BUILTIN_PROVIDERS
            .iter()
            .map(|b| {
                let base = ProviderConfig {
                    id: b.id.to_string(),
                    display_name: b.display_name.to_string(),
                    credential_env: b.env.to_string(),
                    credential: None,
                    model_name: b.model.to_string(),
                    base_url: b.base_url.to_string(),
                    system_prompt: b.system_prompt.to_string(),
                    fallback_message: None,
                };
                match overrides.get(b.id) {
                    Some(o) => apply_override(base, o),
                    None => base,
                }
            })
            .collect();

        for (id, o) in overrides {
            if providers.iter().any(|p| &p.id == id) {
                continue;
            }
            let (Some(model), Some(base_url)) = (&o.model, &o.base_url) else {
                warn!(
                    "provider '{}' in config needs both model and base_url; skipping",
                    id
                );
                continue;
            };
            let base = ProviderConfig {
                id: id.clone(),
                display_name: id.clone(),
                credential_env: format!("{}_API_KEY", id.to_ascii_uppercase()),
                credential: None,
                model_name: model.clone(),
                base_url: base_url.clone(),
                system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
                fallback_message: None,
            };
            providers.push(apply_override(base, o));
        }

        for provider in &mut providers {
            provider.credential = lookup(&provider.credential_env).filter(|k| !k.trim().is_empty());
            debug!(
                provider = %provider.id,
                configured = provider.credential.is_some(),
                "resolved provider credential"
            );
        }

        Self { providers }
    }

    pub fn resolve(&self, provider_id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == provider_id)
    }

    pub fn providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// Whether each provider has a credential configured. No network access.
    pub fn list_availability(&self) -> BTreeMap<String, Availability> {
        self.providers
            .iter()
            .map(|p| {
                let available = p.has_credential();
                (
                    p.id.clone(),
                    Availability {
                        available,
                        reason: (!available).then(|| KEY_NOT_CONFIGURED.to_string()),
                    },
                )
            })
            .collect()
    }
}

fn apply_override(mut base: ProviderConfig, o: &ProviderOverride) -> ProviderConfig {
    if let Some(name) = &o.display_name {
        base.display_name = name.clone();
    }
    if let Some(model) = &o.model {
        base.model_name = model.clone();
    }
    if let Some(url) = &o.base_url {
        base.base_url = url.clone();
    }
    if let Some(prompt) = &o.system_prompt {
        base.system_prompt = prompt.clone();
    }
    if let Some(env) = &o.api_key_env {
        base.credential_env = env.clone();
    }
    if o.fallback_message.is_some() {
        base.fallback_message = o.fallback_message.clone();
    }
    base
}
