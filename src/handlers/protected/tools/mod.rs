pub mod alt_text;
pub mod metadata;

pub use alt_text::post as alt_text_post;
pub use metadata::post as metadata_post;

use std::net::SocketAddr;

use axum::http::HeaderMap;
use serde_json::{json, Map, Value};

use crate::auth::AuthUser;
use crate::database::models::{NewToolRun, RunStatus, ToolName};
use crate::error::ApiError;
use crate::handlers::utils::ensure;
use crate::middleware::{client_ip, RateLimiter};
use crate::services::tool_history;
use crate::state::AppState;

/// Role check, then the per-IP limiter of this tool. A rejected request is
/// still written to the run history.
async fn admit(
    state: &AppState,
    user: &AuthUser,
    tool: ToolName,
    limiter: &RateLimiter,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<(), ApiError> {
    ensure(user.role.can_author(), "Forbidden: You do not have permission to access this tool.")?;

    let ip = client_ip(headers, peer);
    if limiter.check(&ip) {
        return Ok(());
    }

    tracing::warn!("[RateLimit] Blocked {} for {}", ip, tool.as_str());
    record_failure(
        state,
        user,
        tool,
        json!({ "error": "Rate limit exceeded for initial request" }),
        json!({ "error": "Rate limit exceeded" }),
        "Rate limit exceeded.",
    )
    .await;
    Err(ApiError::too_many_requests("Rate limit exceeded. Please try again in a minute."))
}

/// Request body as a JSON object. Unparseable bodies are recorded as failed runs.
async fn parse_body(state: &AppState, user: &AuthUser, tool: ToolName, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => {
            let message = "Invalid JSON payload.";
            record_failure(
                state,
                user,
                tool,
                json!({ "error": "Failed to parse request or early error" }),
                json!({ "error": message }),
                message,
            )
            .await;
            Err(ApiError::invalid_json(message))
        }
    }
}

async fn record_failure(state: &AppState, user: &AuthUser, tool: ToolName, inputs: Value, outputs: Value, message: &str) {
    tool_history::record(
        &state.db,
        NewToolRun {
            user_id: user.id,
            tool_name: tool,
            inputs,
            outputs,
            status: RunStatus::Failure,
            error_message: Some(message.to_string()),
            brand_id: None,
        },
    )
    .await;
}

/// History row and response envelope for a finished batch. `error` is the
/// first failure message, which also marks the run as failed.
async fn finish_run(
    state: &AppState,
    user: &AuthUser,
    tool: ToolName,
    inputs: Map<String, Value>,
    results: Value,
    error: Option<String>,
) -> Value {
    let status = if error.is_some() { RunStatus::Failure } else { RunStatus::Success };

    tool_history::record(
        &state.db,
        NewToolRun {
            user_id: user.id,
            tool_name: tool,
            inputs: Value::Object(inputs),
            outputs: json!({ "results": results }),
            status,
            error_message: error.clone(),
            brand_id: None,
        },
    )
    .await;

    let mut response = json!({
        "success": error.is_none(),
        "userId": user.id,
        "results": results,
    });
    if let Some(error) = error {
        response["error"] = json!(error);
    }
    response
}
