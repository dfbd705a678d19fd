use axum::{extract::State, Extension};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::utils::{ensure, string_list};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::brand_service::{brand_changes, require_name};
use crate::services::BrandService;
use crate::state::AppState;

/// GET /api/brands - Brands visible to the caller, by name
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Value>> {
    let service = BrandService::new(&state.db);

    let brands = if user.is_admin() {
        service.list(None).await?
    } else {
        let ids = state.permissions().permitted_brand_ids(&user).await?;
        if ids.is_empty() {
            Vec::new()
        } else {
            service.list(Some(ids.as_slice())).await?
        }
    };

    Ok(ApiResponse::success(brands))
}

/// POST /api/brands - Create a brand (global admins only)
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Map<String, Value>> {
    ensure(user.is_admin(), "Forbidden: You do not have permission to create brands.")?;
    require_name(&body)?;

    let service = BrandService::new(&state.db);
    let record = brand_changes(&body)?;
    let mut brand = service
        .create(&record)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to create brand"))?;

    let Some(brand_id) = brand.get("id").and_then(Value::as_str).and_then(|id| Uuid::parse_str(id).ok()) else {
        tracing::error!("[API Brands POST] Inserted brand row has no id");
        return Err(ApiError::internal_server_error("Failed to create brand"));
    };

    if let Some(agencies) = string_list(&body, "selected_agency_ids") {
        let country = brand.get("country").and_then(Value::as_str).map(str::to_string);
        service.replace_agencies(brand_id, &agencies, country.as_deref()).await?;
    }
    brand.insert("selected_vetting_agencies".into(), json!(service.selected_agencies(brand_id).await?));

    tracing::info!("[API Brands POST] Created brand {} by {}", brand_id, user.id);
    Ok(ApiResponse::created(brand))
}
