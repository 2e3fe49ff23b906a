use serde_json::json;
use toolchat_agents::{CloneRequest, PageFetchCloner, RemoteFunctionCloner, WebsiteCloner};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clone_request(url: String, include_external_assets: bool) -> CloneRequest {
    CloneRequest {
        url,
        output_format: "HTML".to_string(),
        include_external_assets,
    }
}

#[tokio::test]
async fn page_fetch_returns_markup_and_assets() {
    let mock_server = MockServer::start().await;
    let html = r#"<html><head><link rel="stylesheet" href="/style.css"></head>
<body><img src="img/logo.png"><script src="https://cdn.example.net/app.js"></script></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(&mock_server)
        .await;

    let cloner = PageFetchCloner::new("toolchat-test").unwrap();
    let result = cloner
        .clone_website(&clone_request(format!("{}/landing", mock_server.uri()), true))
        .await
        .unwrap();

    assert_eq!(result["status"], 200);
    assert_eq!(result["output_format"], "HTML");
    assert_eq!(result["html"], html);
    let assets: Vec<&str> = result["external_assets"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(
        assets,
        [
            format!("{}/style.css", mock_server.uri()),
            format!("{}/img/logo.png", mock_server.uri()),
            "https://cdn.example.net/app.js".to_string(),
        ]
    );
}

#[tokio::test]
async fn page_fetch_omits_assets_unless_requested() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
        .mount(&mock_server)
        .await;

    let cloner = PageFetchCloner::new("toolchat-test").unwrap();
    let result = cloner
        .clone_website(&clone_request(mock_server.uri(), false))
        .await
        .unwrap();

    assert!(result.get("external_assets").is_none());
    assert_eq!(result["bytes"], 9);
    assert_eq!(result["truncated"], false);
}

#[tokio::test]
async fn page_fetch_truncates_oversized_pages() {
    let mock_server = MockServer::start().await;
    let page = format!("<html><body>{}</body></html>", "x".repeat(64 * 1024));
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;

    let cloner = PageFetchCloner::new("toolchat-test")
        .unwrap()
        .with_max_bytes(1024);
    let result = cloner
        .clone_website(&clone_request(mock_server.uri(), false))
        .await
        .unwrap();

    assert_eq!(result["truncated"], true);
    assert_eq!(result["bytes"], 1024);
    let html = result["html"].as_str().unwrap();
    assert_eq!(html.len(), 1024);
    assert!(html.starts_with("<html><body>xxx"));
}

#[tokio::test]
async fn page_fetch_error_status_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let cloner = PageFetchCloner::new("toolchat-test").unwrap();
    let err = cloner
        .clone_website(&clone_request(mock_server.uri(), false))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn remote_function_posts_invocation() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/functions/invoke"))
        .and(header("authorization", "Bearer fn-key"))
        .and(body_json(json!({
            "function_name": "clone_website",
            "arguments": {
                "url": "https://example.com",
                "output_format": "HTML",
                "include_external_assets": false
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "archive": "site.zip" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cloner = RemoteFunctionCloner::new(
        format!("{}/functions/invoke", mock_server.uri()),
        Some("fn-key".to_string()),
    );
    let result = cloner
        .clone_website(&clone_request("https://example.com".to_string(), false))
        .await
        .unwrap();

    assert_eq!(result["archive"], "site.zip");
}

#[tokio::test]
async fn remote_function_failure_carries_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&mock_server)
        .await;

    let cloner = RemoteFunctionCloner::new(mock_server.uri(), None);
    let err = cloner
        .clone_website(&clone_request("https://example.com".to_string(), true))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("502"));
    assert!(message.contains("bad gateway"));
}
