use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::chat;
use crate::state::SharedState;

/// Build the application router. Rate limiting needs peer addresses and is
/// layered on by [`crate::GatewayServer`].
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);

    Router::new()
        .route("/chat", get(chat::chat_status).post(chat::chat))
        .route("/health", get(health))
        .route("/api/providers", get(list_providers))
        .route("/api/tools", get(list_tools))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

async fn health() -> &'static str {
    "ok"
}

async fn list_providers(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let registry = state.orchestrator.providers();
    let providers: Vec<serde_json::Value> = registry
        .providers()
        .iter()
        .map(|p| {
            serde_json::json!({
                "id": p.id,
                "displayName": p.display_name,
                "model": p.model_name,
                "available": p.has_credential(),
            })
        })
        .collect();

    Json(serde_json::json!({ "providers": providers }))
}

async fn list_tools(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "tools": state.orchestrator.tools().list_tools() }))
}
