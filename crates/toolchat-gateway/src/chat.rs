use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::{Value, json};
use toolchat_agents::ChatRequest;
use toolchat_agents::orchestrator::{INVALID_MESSAGE, INVALID_PROVIDER};
use toolchat_common::{ChatMessage, ChatRole, Error};
use tracing::{Instrument, error, info_span};
use uuid::Uuid;

use crate::state::SharedState;

pub const INVALID_HISTORY: &str = "Invalid history";
const SERVICE_UNAVAILABLE: &str = "Chat service unavailable";

/// Why a `POST /chat` body was turned away before reaching the orchestrator.
#[derive(Debug)]
pub enum ChatRejection {
    BadRequest(String),
    Unexpected(String),
}

impl IntoResponse for ChatRejection {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Unexpected(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": SERVICE_UNAVAILABLE,
                    "message": message,
                })),
            )
                .into_response(),
        }
    }
}

impl From<Error> for ChatRejection {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(message) => Self::BadRequest(message),
            other => Self::Unexpected(other.to_string()),
        }
    }
}

/// `POST /chat`
pub async fn chat(State(state): State<SharedState>, body: Bytes) -> Response {
    let span = info_span!("chat_request", request_id = %Uuid::new_v4());
    async move {
        let request = match decode_chat_request(&body) {
            Ok(request) => request,
            Err(rejection) => return rejection.into_response(),
        };

        match state.orchestrator.handle(request).await {
            Ok(response) => Json(response).into_response(),
            Err(err) => {
                if !err.is_validation() {
                    error!("chat request failed: {}", err);
                }
                ChatRejection::from(err).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// `GET /chat`
pub async fn chat_status(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "providers": state.health.report(),
        "timestamp": Utc::now(),
    }))
}

/// Parse the raw body. Field checks run in the order the client sees them
/// reported: message, provider, then history.
pub fn decode_chat_request(body: &[u8]) -> Result<ChatRequest, ChatRejection> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ChatRejection::Unexpected(format!("invalid request body: {e}")))?;

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ChatRejection::BadRequest(INVALID_MESSAGE.to_string()))?;

    let provider_id = value
        .get("providerId")
        .or_else(|| value.get("provider"))
        .and_then(Value::as_str)
        .ok_or_else(|| ChatRejection::BadRequest(INVALID_PROVIDER.to_string()))?;

    let history = match value.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value::<Vec<ChatMessage>>(raw.clone())
            .ok()
            .filter(|history| tool_turns_are_paired(history))
            .ok_or_else(|| ChatRejection::BadRequest(INVALID_HISTORY.to_string()))?,
    };

    Ok(ChatRequest {
        message: message.to_string(),
        provider_id: provider_id.to_string(),
        history,
    })
}

/// Every assistant tool call must be answered by a `tool` entry carrying its id,
/// before any other turn, and every `tool` entry must answer such a call.
fn tool_turns_are_paired(history: &[ChatMessage]) -> bool {
    let mut pending: Vec<&str> = Vec::new();
    for message in history {
        match message.role {
            ChatRole::Tool => {
                let Some(id) = message.tool_call_id.as_deref() else {
                    return false;
                };
                let Some(pos) = pending.iter().position(|p| *p == id) else {
                    return false;
                };
                pending.remove(pos);
            }
            _ if !pending.is_empty() => return false,
            ChatRole::Assistant => {
                if message
                    .tool_calls
                    .iter()
                    .any(|c| c.id.trim().is_empty() || c.tool_name.trim().is_empty())
                {
                    return false;
                }
                pending = message.tool_calls.iter().map(|c| c.id.as_str()).collect();
            }
            ChatRole::User | ChatRole::System => {}
        }
    }
    pending.is_empty()
}
