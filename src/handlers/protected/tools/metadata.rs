use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{admit, finish_run, parse_body, record_failure};
use crate::auth::AuthUser;
use crate::database::models::ToolName;
use crate::error::ApiError;
use crate::state::AppState;

const TOOL: ToolName = ToolName::MetadataGenerator;
const DEFAULT_COUNTRY: &str = "US";
const RUN_FAILED: &str = "One or more URLs failed metadata generation.";

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResult {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MetadataResult {
    fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Only absolute URLs are scraped and sent to the model
fn page_url(entry: &Value) -> Option<&str> {
    entry.as_str().filter(|url| url::Url::parse(url).is_ok())
}

/// POST /api/tools/metadata-generator `{ urls: [...], language? }`
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    admit(&state, &user, TOOL, &state.limits.metadata, &headers, peer.map(|ConnectInfo(addr)| addr)).await?;
    let inputs = parse_body(&state, &user, TOOL, &body).await?;

    let urls: Vec<Value> = inputs
        .get("urls")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if urls.is_empty() {
        let message = "An array of URLs is required";
        record_failure(&state, &user, TOOL, Value::Object(inputs), json!({ "error": message }), message).await;
        return Err(ApiError::bad_request(message));
    }

    let language = inputs
        .get("language")
        .and_then(Value::as_str)
        .filter(|l| !l.is_empty())
        .unwrap_or("en")
        .to_string();

    let mut results = Vec::with_capacity(urls.len());
    let mut run_error: Option<String> = None;

    for entry in &urls {
        let Some(url) = page_url(entry) else {
            let shown = entry.as_str().map(str::to_string).unwrap_or_else(|| entry.to_string());
            tracing::error!("[MetadataGen] Invalid URL: {}", shown);
            results.push(MetadataResult::failed(shown, "Invalid URL format."));
            run_error.get_or_insert_with(|| RUN_FAILED.to_string());
            continue;
        };

        let page_content = match state.scraper.fetch_text(url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("[MetadataGen] Failed to fetch content for URL {}: {}", url, e);
                String::new()
            }
        };

        tokio::time::sleep(state.ai_delay).await;
        match state.generators.metadata(url, &language, DEFAULT_COUNTRY, &page_content).await {
            Ok(generated) => results.push(MetadataResult {
                url: url.to_string(),
                meta_title: generated.meta_title,
                meta_description: generated.meta_description,
                keywords: Some(generated.keywords),
                error: None,
            }),
            Err(e) => {
                tracing::error!("[MetadataGen] Error processing URL {}: {}", url, e);
                results.push(MetadataResult::failed(url, e.to_string()));
                run_error.get_or_insert_with(|| RUN_FAILED.to_string());
            }
        }
    }

    let response = finish_run(&state, &user, TOOL, inputs, json!(results), run_error).await;
    Ok(Json(response))
}
