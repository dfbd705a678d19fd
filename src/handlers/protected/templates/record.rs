use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Map, Value};

use super::{ensure_reader, regenerate_description};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::utils::{ensure, parse_id};
use crate::middleware::{success_with, ApiJson};
use crate::services::template_service::TemplateInput;
use crate::services::TemplateService;
use crate::state::AppState;

/// GET /api/content-templates/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure_reader(&user)?;
    let template_id = parse_id(&id, "template")?;

    let Some(template) = TemplateService::new(&state.db)
        .find(template_id)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to fetch content template"))?
    else {
        return Err(ApiError::not_found("Content template not found"));
    };

    Ok(success_with(json!({ "template": template })))
}

/// PUT /api/content-templates/:id - Global admins only
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    ensure(user.is_admin(), "Forbidden: You do not have permission to update this resource.")?;
    let template_id = parse_id(&id, "template")?;
    let input = TemplateInput::from_body(&body)?;

    let description = regenerate_description(&state, &input).await;
    let Some(template) = TemplateService::new(&state.db)
        .update(template_id, &input.record(&description))
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to update content template"))?
    else {
        return Err(ApiError::not_found("Template not found after update."));
    };

    Ok(success_with(json!({ "template": template })))
}

/// DELETE /api/content-templates/:id - Detaches content, then removes the template
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ensure(user.is_admin(), "Forbidden: You do not have permission to delete this resource.")?;
    let template_id = parse_id(&id, "template")?;

    match TemplateService::new(&state.db).delete_and_update_content(template_id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Err(ApiError::not_found("Template not found or already deleted.")),
        Err(e) => return Err(ApiError::from_database(e, "Failed to delete content template")),
    }

    tracing::info!("[API Templates DELETE /{}] Deleted by {}", template_id, user.id);
    Ok(success_with(json!({
        "message": "Content template deleted successfully and associated content items have been updated."
    })))
}
