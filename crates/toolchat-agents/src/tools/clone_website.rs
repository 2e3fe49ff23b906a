use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use toolchat_common::{Error, Result};
use tracing::{debug, info};
use url::Url;

pub const CLONE_WEBSITE: &str = "clone_website";

const DEFAULT_OUTPUT_FORMAT: &str = "HTML";
const DEFAULT_MAX_BYTES: usize = 512 * 1024;

/// Raw `clone_website` arguments as emitted by a provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CloneWebsiteArgs {
    pub url: Option<String>,
    pub output_format: Option<String>,
    pub include_external_assets: Option<bool>,
}

/// Validated `clone_website` invocation with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneRequest {
    pub url: String,
    pub output_format: String,
    pub include_external_assets: bool,
}

impl CloneWebsiteArgs {
    /// Check the URL and fill in defaults. `None` means the URL is unusable.
    pub fn validate(self) -> Option<CloneRequest> {
        let url = self.url.filter(|u| is_http_url(u))?;
        Some(CloneRequest {
            url,
            output_format: self
                .output_format
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string()),
            include_external_assets: self.include_external_assets.unwrap_or(false),
        })
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

/// The capability that actually clones a site.
#[async_trait]
pub trait WebsiteCloner: Send + Sync {
    async fn clone_website(&self, request: &CloneRequest) -> Result<serde_json::Value>;
}

// ---------------------------------------------------------------------------
// PageFetchCloner
// ---------------------------------------------------------------------------

/// Fetches the page directly and returns its markup, optionally listing the
/// external assets it references.
pub struct PageFetchCloner {
    client: Client,
    max_bytes: usize,
}

impl PageFetchCloner {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Tool(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    /// Stop reading the page after `max_bytes`; the markup is marked truncated.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl WebsiteCloner for PageFetchCloner {
    async fn clone_website(&self, request: &CloneRequest) -> Result<serde_json::Value> {
        let mut response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| Error::Tool(format!("failed to fetch {}: {e}", request.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Tool(format!(
                "fetching {} returned status {}",
                request.url,
                status.as_u16()
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Tool(format!("failed to read body of {}: {e}", request.url)))?
        {
            let room = self.max_bytes - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }
        let html = decode_body(body, truncated);

        info!(url = %final_url, bytes = html.len(), truncated, "fetched page for cloning");

        let mut result = json!({
            "final_url": final_url.as_str(),
            "status": status.as_u16(),
            "content_type": content_type,
            "output_format": request.output_format,
            "bytes": html.len(),
            "truncated": truncated,
        });
        if request.include_external_assets {
            result["external_assets"] = json!(external_assets(&final_url, &html));
        }
        result["html"] = json!(html);
        Ok(result)
    }
}

/// Lossy UTF-8 decode. A multi-byte character split by truncation is dropped
/// rather than replaced.
fn decode_body(mut body: Vec<u8>, truncated: bool) -> String {
    if truncated
        && let Err(e) = std::str::from_utf8(&body)
        && e.error_len().is_none()
    {
        body.truncate(e.valid_up_to());
    }
    String::from_utf8_lossy(&body).into_owned()
}

static ASSET_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(?:script|img|link|source|video|audio)\b[^>]*?\s(?:src|href)\s*=\s*["']([^"']+)["']"#)
        .expect("asset regex should compile")
});

// Fonts and background images referenced from inline CSS.
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\burl\(\s*["']?([^"')\s]+)["']?\s*\)"#).expect("css url regex should compile")
});

/// Absolute http(s) URLs of scripts, stylesheets, fonts and media referenced by `html`.
pub fn external_assets(base: &Url, html: &str) -> Vec<String> {
    let mut assets: Vec<String> = Vec::new();
    let references = ASSET_REF
        .captures_iter(html)
        .chain(CSS_URL.captures_iter(html))
        .filter_map(|caps| caps.get(1));
    for reference in references {
        let Ok(resolved) = base.join(reference.as_str().trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let resolved = resolved.to_string();
        if !assets.contains(&resolved) {
            assets.push(resolved);
        }
    }
    debug!(count = assets.len(), "collected external assets");
    assets
}

// ---------------------------------------------------------------------------
// RemoteFunctionCloner
// ---------------------------------------------------------------------------

/// Delegates cloning to a hosted function-invocation endpoint.
pub struct RemoteFunctionCloner {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct FunctionInvocation<'a> {
    function_name: &'a str,
    arguments: &'a CloneRequest,
}

impl RemoteFunctionCloner {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl WebsiteCloner for RemoteFunctionCloner {
    async fn clone_website(&self, request: &CloneRequest) -> Result<serde_json::Value> {
        let mut builder = self.client.post(&self.endpoint).json(&FunctionInvocation {
            function_name: CLONE_WEBSITE,
            arguments: request,
        });
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Tool(format!("clone function request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tool(format!(
                "clone function returned status {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Tool(format!("invalid clone function response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(url: Option<&str>) -> CloneWebsiteArgs {
        CloneWebsiteArgs {
            url: url.map(str::to_string),
            ..CloneWebsiteArgs::default()
        }
    }

    #[test]
    fn rejects_missing_and_non_http_urls() {
        assert!(args(None).validate().is_none());
        assert!(args(Some("not-a-url")).validate().is_none());
        assert!(args(Some("ftp://example.com/file")).validate().is_none());
        assert!(args(Some("javascript:alert(1)")).validate().is_none());
    }

    #[test]
    fn applies_defaults_for_omitted_fields() {
        let request = args(Some("https://example.com")).validate().unwrap();
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.output_format, "HTML");
        assert!(!request.include_external_assets);
    }

    #[test]
    fn empty_output_format_falls_back_to_html() {
        let request = CloneWebsiteArgs {
            url: Some("http://example.com".into()),
            output_format: Some(String::new()),
            include_external_assets: Some(true),
        }
        .validate()
        .unwrap();
        assert_eq!(request.output_format, "HTML");
        assert!(request.include_external_assets);
    }

    #[test]
    fn collects_resolved_asset_urls_once() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let html = r#"
            <link rel="stylesheet" href="/css/site.css">
            <script src="app.js"></script>
            <img src="https://cdn.example.net/logo.png" alt="">
            <img src='/css/site.css'>
            <a href="/about">About</a>
            <img src="data:image/png;base64,AAAA">
        "#;
        let assets = external_assets(&base, html);
        assert_eq!(
            assets,
            [
                "https://example.com/css/site.css",
                "https://example.com/blog/app.js",
                "https://cdn.example.net/logo.png",
            ]
        );
    }

    #[test]
    fn data_attributes_are_not_assets() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = r#"<img data-src="/lazy.png" src="/real.png"><link data-href="/x.css" rel="preload">"#;
        assert_eq!(external_assets(&base, html), ["https://example.com/real.png"]);
    }

    #[test]
    fn css_url_references_are_assets() {
        let base = Url::parse("https://example.com/site/").unwrap();
        let html = r#"<style>
            @font-face { font-family: Tajawal; src: url("fonts/tajawal.woff2") format("woff2"); }
            body { background: url(/img/bg.jpg) no-repeat; }
            .icon { background-image: url('data:image/svg+xml;base64,AAAA'); }
        </style>"#;
        assert_eq!(
            external_assets(&base, html),
            [
                "https://example.com/site/fonts/tajawal.woff2",
                "https://example.com/img/bg.jpg",
            ]
        );
    }

    #[test]
    fn truncated_body_drops_split_character() {
        let mut bytes = "مرحبا".as_bytes().to_vec();
        bytes.truncate(3);
        assert_eq!(decode_body(bytes, true), "م");
        assert_eq!(decode_body(b"plain".to_vec(), false), "plain");
    }
}
