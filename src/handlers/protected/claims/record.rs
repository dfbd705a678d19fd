use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::auth::AuthUser;
use crate::database::models::Claim;
use crate::error::ApiError;
use crate::handlers::utils::{ensure, parse_id};
use crate::middleware::{success_with, ApiJson, ApiResponse, ApiResult};
use crate::permissions::ClaimContext;
use crate::services::claim_service::{claim_changes, claim_write_error};
use crate::services::ClaimService;
use crate::state::AppState;

/// GET /api/claims/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Claim> {
    let claim_id = parse_id(&id, "claim")?;
    let Some(claim) = ClaimService::new(&state.db).find(claim_id).await? else {
        return Err(ApiError::not_found("Claim not found."));
    };

    ensure(
        state.permissions().can_read_claim(&user, &ClaimContext::from(&claim)).await?,
        "You do not have permission to view this claim.",
    )?;
    Ok(ApiResponse::success(claim))
}

/// PUT /api/claims/:id - Text, type, description and country only
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Map<String, Value>> {
    let claim_id = parse_id(&id, "claim")?;
    let changes = claim_changes(&body)?;

    ensure(
        state.permissions().can_write_claim(&user, claim_id).await?,
        "You do not have permission to update this claim.",
    )?;

    let Some(updated) = ClaimService::new(&state.db)
        .update(claim_id, &changes)
        .await
        .map_err(|e| claim_write_error(e, "Failed to update claim"))?
    else {
        return Err(ApiError::not_found("Claim not found or update failed."));
    };

    tracing::info!("[API Claims PUT /{}] Updated by {}", claim_id, user.id);
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/claims/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let claim_id = parse_id(&id, "claim")?;
    ensure(
        state.permissions().can_write_claim(&user, claim_id).await?,
        "You do not have permission to delete this claim.",
    )?;

    let removed = ClaimService::new(&state.db)
        .delete(claim_id)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to delete claim"))?;
    if removed == 0 {
        return Err(ApiError::not_found("Claim not found."));
    }

    tracing::info!("[API Claims DELETE /{}] Deleted by {}", claim_id, user.id);
    Ok(success_with(json!({ "message": "Claim deleted successfully." })))
}
