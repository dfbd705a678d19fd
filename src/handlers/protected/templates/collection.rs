use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::{ensure_reader, regenerate_description};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::utils::ensure;
use crate::middleware::{success_with, ApiJson, ApiQuery};
use crate::services::template_service::TemplateInput;
use crate::services::TemplateService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    pub brand_id: Option<Uuid>,
}

/// GET /api/content-templates[?brand_id=]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<TemplateQuery>,
) -> Result<Json<Value>, ApiError> {
    ensure_reader(&user)?;
    let templates = TemplateService::new(&state.db)
        .list(query.brand_id)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to fetch content templates"))?;
    Ok(success_with(json!({ "templates": templates })))
}

/// POST /api/content-templates - Global admins only
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    ensure(user.is_admin(), "Forbidden: You do not have permission to create this resource.")?;
    let input = TemplateInput::from_body(&body)?;

    let description = regenerate_description(&state, &input).await;
    let template = TemplateService::new(&state.db)
        .create(input.record(&description), user.id)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to create content template"))?;

    Ok((StatusCode::CREATED, success_with(json!({ "template": template }))))
}
