use serde::{Deserialize, Serialize};
use serde_json::json;

pub mod clone_website;
pub mod executor;

pub use clone_website::{
    CLONE_WEBSITE, CloneRequest, CloneWebsiteArgs, PageFetchCloner, RemoteFunctionCloner,
    WebsiteCloner,
};
pub use executor::{ToolExecutor, ToolOutcome, ToolResultEnvelope};

/// A tool offered to providers, with its JSON-schema argument contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// Passed through to the provider; arguments are not checked against it locally.
    pub strict: bool,
    pub parameters: serde_json::Value,
}

/// Static catalog of tools, built once per process.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolSpec>) -> Self {
        Self { tools }
    }

    /// The tools this service ships with.
    pub fn builtin() -> Self {
        Self::new(vec![clone_website_spec()])
    }

    pub fn list_tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }
}

fn clone_website_spec() -> ToolSpec {
    ToolSpec {
        name: CLONE_WEBSITE.to_string(),
        description: "Fetch all content from a web link and redesign the website to replicate it exactly."
            .to_string(),
        strict: true,
        parameters: json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The web link to fetch and clone"
                },
                "output_format": {
                    "type": "string",
                    "description": "Requested format for redesigned website output, such as 'HTML', 'ZIP', or 'directory'"
                },
                "include_external_assets": {
                    "type": "boolean",
                    "description": "Whether to include linked external assets like scripts, fonts, and images"
                }
            },
            "required": ["url", "output_format", "include_external_assets"],
            "additionalProperties": false
        }),
    }
}
