use std::sync::Arc;

use toolchat_agents::{
    CompletionOrchestrator, HealthReporter, PageFetchCloner, ProviderRegistry,
    RemoteFunctionCloner, ToolExecutor, ToolRegistry, WebsiteCloner,
};
use toolchat_common::{Error, Result};
use toolchat_config::{AppConfig, CloneBackend, CloneWebsiteConfig};
use tracing::info;

/// Read-only state shared by every request handler.
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: CompletionOrchestrator,
    pub health: HealthReporter,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, orchestrator: CompletionOrchestrator) -> Self {
        let health = HealthReporter::new(orchestrator.providers().clone());
        Self {
            config,
            orchestrator,
            health,
        }
    }

    /// Build registries, the tool executor and provider clients from `config`
    /// and the process environment.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let providers = Arc::new(ProviderRegistry::from_env(&config.providers));
        let tools = Arc::new(ToolRegistry::builtin());
        let executor = ToolExecutor::new(build_cloner(&config.tools.clone_website)?);

        let mut orchestrator =
            CompletionOrchestrator::new(providers, tools, executor).with_chat_config(&config.chat);
        orchestrator.connect_configured_providers();

        Ok(Self::new(config, orchestrator))
    }
}

fn build_cloner(config: &CloneWebsiteConfig) -> Result<Arc<dyn WebsiteCloner>> {
    match config.backend {
        CloneBackend::Fetch => {
            info!("clone_website uses direct page fetch");
            Ok(Arc::new(
                PageFetchCloner::new(&config.user_agent)?.with_max_bytes(config.max_bytes),
            ))
        }
        CloneBackend::Remote => {
            let endpoint = config.endpoint.clone().ok_or_else(|| {
                Error::Config("tools.clone_website.endpoint is required for the remote backend".into())
            })?;
            let api_key = config
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|k| !k.trim().is_empty());
            info!(endpoint = %endpoint, "clone_website uses remote function endpoint");
            Ok(Arc::new(RemoteFunctionCloner::new(endpoint, api_key)))
        }
    }
}
