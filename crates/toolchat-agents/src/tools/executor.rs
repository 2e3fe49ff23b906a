use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use toolchat_common::Error;
use tracing::{info, instrument, warn};

use crate::tools::clone_website::{CLONE_WEBSITE, CloneRequest, CloneWebsiteArgs, WebsiteCloner};

const INVALID_URL: &str = "Invalid URL provided";
const CLONE_FAILED: &str = "Failed to clone website";

/// Outcome of one tool invocation. Failures are carried here, never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResultEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub outcome: Option<ToolOutcome>,
    pub timestamp: DateTime<Utc>,
}

/// Tool-specific payload of a successful invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    CloneWebsite {
        url: String,
        output_format: String,
        include_external_assets: bool,
        result: serde_json::Value,
    },
}

impl ToolResultEnvelope {
    pub fn succeeded(outcome: ToolOutcome) -> Self {
        Self {
            success: true,
            error: None,
            outcome: Some(outcome),
            timestamp: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            outcome: None,
            timestamp: Utc::now(),
        }
    }

    /// JSON form sent back to the provider as the tool message content.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"success":{},"error":"unserializable tool result"}}"#,
                self.success
            )
        })
    }
}

/// Arguments decoded per tool name.
enum ToolInvocation {
    CloneWebsite(CloneWebsiteArgs),
    Unknown(String),
}

impl ToolInvocation {
    fn parse(tool_name: &str, arguments_json: &str) -> Result<Self, String> {
        let raw: serde_json::Value =
            serde_json::from_str(arguments_json).map_err(|e| e.to_string())?;
        match tool_name {
            CLONE_WEBSITE => serde_json::from_value(raw)
                .map(Self::CloneWebsite)
                .map_err(|e| e.to_string()),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// Validates and runs a single tool call.
pub struct ToolExecutor {
    cloner: Arc<dyn WebsiteCloner>,
}

impl ToolExecutor {
    pub fn new(cloner: Arc<dyn WebsiteCloner>) -> Self {
        Self { cloner }
    }

    #[instrument(skip(self, arguments_json))]
    pub async fn execute(&self, tool_name: &str, arguments_json: &str) -> ToolResultEnvelope {
        let invocation = match ToolInvocation::parse(tool_name, arguments_json) {
            Ok(invocation) => invocation,
            Err(message) => {
                warn!("could not decode tool arguments: {}", message);
                return ToolResultEnvelope::failed(message);
            }
        };

        match invocation {
            ToolInvocation::CloneWebsite(args) => match args.validate() {
                Some(request) => self.clone_website(request).await,
                None => ToolResultEnvelope::failed(INVALID_URL),
            },
            ToolInvocation::Unknown(name) => {
                warn!("provider requested unknown tool '{}'", name);
                ToolResultEnvelope::failed(format!("Unknown tool: {name}"))
            }
        }
    }

    async fn clone_website(&self, request: CloneRequest) -> ToolResultEnvelope {
        match self.cloner.clone_website(&request).await {
            Ok(result) => {
                info!(url = %request.url, format = %request.output_format, "website cloned");
                ToolResultEnvelope::succeeded(ToolOutcome::CloneWebsite {
                    url: request.url,
                    output_format: request.output_format,
                    include_external_assets: request.include_external_assets,
                    result,
                })
            }
            Err(err) => {
                warn!(url = %request.url, "clone_website failed: {}", err);
                ToolResultEnvelope::failed(failure_message(err))
            }
        }
    }
}

fn failure_message(err: Error) -> String {
    let message = match err {
        Error::Tool(message) => message,
        other => other.to_string(),
    };
    if message.trim().is_empty() {
        CLONE_FAILED.to_string()
    } else {
        message
    }
}
