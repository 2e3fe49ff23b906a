pub mod conversation;
pub mod fallback;
pub mod health;
pub mod orchestrator;
pub mod providers;
pub mod registry;
pub mod tools;

pub use conversation::ConversationBuilder;
pub use fallback::FallbackHandler;
pub use health::{HealthReporter, ProviderHealth};
pub use orchestrator::{ChatRequest, ChatResponse, CompletionOrchestrator};
pub use providers::{LlmProvider, LlmRequest, LlmResponse, OpenAiProvider, ToolChoice, Usage};
pub use registry::{Availability, ProviderConfig, ProviderRegistry};
pub use tools::{
    CloneRequest, PageFetchCloner, RemoteFunctionCloner, ToolExecutor, ToolOutcome, ToolRegistry,
    ToolResultEnvelope, ToolSpec, WebsiteCloner,
};
