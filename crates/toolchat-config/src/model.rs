use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub chat: ChatConfig,
    /// Per-provider overrides keyed by provider id. Unknown ids add new providers.
    pub providers: BTreeMap<String, ProviderOverride>,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub rate_limit: RateLimitConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: 1,
            burst_size: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Most recent history entries forwarded to the provider.
    pub history_limit: usize,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOverride {
    pub display_name: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub system_prompt: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
    /// Apology shown when this provider fails.
    pub fallback_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub clone_website: CloneWebsiteConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneWebsiteConfig {
    pub backend: CloneBackend,
    /// Function-invocation endpoint used by the `remote` backend.
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub user_agent: String,
    /// Page bytes kept by the `fetch` backend; longer pages are truncated.
    pub max_bytes: usize,
}

impl Default for CloneWebsiteConfig {
    fn default() -> Self {
        Self {
            backend: CloneBackend::Fetch,
            endpoint: None,
            api_key_env: None,
            user_agent: concat!("toolchat/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 512 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloneBackend {
    #[default]
    Fetch,
    Remote,
}
