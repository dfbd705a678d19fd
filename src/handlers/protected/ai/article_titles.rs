use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ai::AiError;
use crate::auth::AuthUser;
use crate::database::models::BrandContext;
use crate::error::ApiError;
use crate::middleware::{success_with, ApiJson};
use crate::services::BrandService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ArticleTitlesRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub brand_id: Option<String>,
}

/// Brand context for the prompt. Unknown or unreadable brands fall back to
/// generic suggestions.
async fn load_brand(state: &AppState, brand_id: &str) -> Option<BrandContext> {
    let Ok(id) = Uuid::parse_str(brand_id) else {
        tracing::warn!("[Article Titles] Brand id {} is not a UUID. Proceeding without brand context.", brand_id);
        return None;
    };

    match BrandService::new(&state.db).context(id).await {
        Ok(Some(brand)) => Some(brand),
        Ok(None) => {
            tracing::warn!("[Article Titles] Brand {} not found. Proceeding without brand context.", id);
            None
        }
        Err(e) => {
            tracing::warn!("[Article Titles] Brand {} lookup failed: {}. Proceeding without brand context.", id, e);
            None
        }
    }
}

/// Provider request failures are 503; anything else is a 500
fn generation_error(err: &AiError) -> ApiError {
    match err {
        AiError::Http(_) | AiError::Status { .. } => ApiError::service_unavailable("AI service failed to generate titles"),
        _ => ApiError::internal_server_error("Failed to generate article titles"),
    }
}

/// POST /api/content/generate/article-titles `{ topic, brand_id? }`
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ArticleTitlesRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(topic) = request.topic.as_deref().filter(|t| !t.is_empty()) else {
        return Err(ApiError::bad_request("Topic is required in the request body"));
    };

    let brand = match request.brand_id.as_deref().filter(|id| !id.is_empty()) {
        Some(brand_id) => load_brand(&state, brand_id).await,
        None => None,
    };
    if let Some(brand) = &brand {
        if brand.language.as_deref().unwrap_or_default().is_empty()
            || brand.country.as_deref().unwrap_or_default().is_empty()
        {
            return Err(ApiError::bad_request(
                "Brand language and country are required for localized suggestions and are missing for this brand.",
            ));
        }
    }

    let suggestions = state.generators.article_titles(topic, brand.as_ref()).await.map_err(|e| {
        tracing::error!("[Article Titles] Generation failed for {}: {}", user.id, e);
        generation_error(&e)
    })?;

    Ok(success_with(json!({ "suggestions": suggestions })))
}
