use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::utils::{admin_emails, ensure, parse_id, string_list};
use crate::middleware::{success_with, ApiJson, ApiQuery};
use crate::services::brand_service::{brand_changes, brand_name, require_name, BrandUsage};
use crate::services::BrandService;
use crate::state::AppState;

const DATA_SOURCE: HeaderName = HeaderName::from_static("x-data-source");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    pub delete_cascade: Option<String>,
}

impl DeleteQuery {
    /// Only the literal `true` opts into cascading
    pub fn cascade(&self) -> bool {
        self.delete_cascade.as_deref() == Some("true")
    }
}

/// 400 telling the caller to retry with `deleteCascade=true`
fn cascade_required(usage: BrandUsage) -> Response {
    let body = json!({
        "success": false,
        "error": usage.blocking_message(),
        "contentCount": usage.content,
        "workflowCount": usage.workflows,
        "requiresCascade": true,
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// GET /api/brands/:id - Brand with agencies, admins and usage counts
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let brand_id = parse_id(&id, "brand")?;
    ensure(
        state.permissions().can_read_brand(&user, brand_id).await?,
        "Forbidden: You do not have permission to access this brand.",
    )?;

    let service = BrandService::new(&state.db);
    let Some(mut brand) = service.find(brand_id).await? else {
        return Err(ApiError::not_found("Brand not found"));
    };

    let (usage, agencies, admins) = futures::try_join!(
        service.usage(brand_id),
        service.selected_agencies(brand_id),
        service.admins(brand_id),
    )?;
    brand.insert("selected_vetting_agencies".into(), json!(agencies));
    brand.insert("admins".into(), json!(admins));

    let body = json!({
        "success": true,
        "brand": brand,
        "contentCount": usage.content,
        "workflowCount": usage.workflows,
        "meta": {
            "source": "database",
            "isFallback": false,
            "requestId": Uuid::new_v4(),
            "timestamp": Utc::now(),
        }
    });

    Ok((
        [(header::CACHE_CONTROL, "no-store"), (DATA_SOURCE, "database")],
        Json(body),
    )
        .into_response())
}

/// PUT /api/brands/:id - Partial update, admin sync and agency replacement
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let brand_id = parse_id(&id, "brand")?;
    ensure(
        state.permissions().can_admin_brand(&user, brand_id).await?,
        "Forbidden: You do not have admin rights for this brand.",
    )?;
    require_name(&body)?;

    let service = BrandService::new(&state.db);
    let changes = brand_changes(&body)?;

    if let Some(emails) = admin_emails(&body) {
        service.sync_admins(brand_id, &emails, state.invites.as_ref()).await?;
    }

    let Some(mut brand) = service
        .update(brand_id, &changes)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to update brand"))?
    else {
        return Err(ApiError::not_found("Brand not found"));
    };

    if let Some(agencies) = string_list(&body, "selected_agency_ids") {
        let country = brand.get("country").and_then(Value::as_str).map(str::to_string);
        let linked = service.replace_agencies(brand_id, &agencies, country.as_deref()).await?;
        tracing::debug!("[API Brands PUT] Linked {} agencies to brand {}", linked, brand_id);
    }

    brand.insert("selected_vetting_agencies".into(), json!(service.selected_agencies(brand_id).await?));
    Ok(success_with(json!({ "brand": brand })))
}

/// DELETE /api/brands/:id[?deleteCascade=true] - Global admins only
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> Result<Response, ApiError> {
    ensure(user.is_admin(), "Forbidden: You do not have permission to delete this resource.")?;
    let brand_id = parse_id(&id, "brand")?;

    let service = BrandService::new(&state.db);
    let Some(brand) = service.find(brand_id).await? else {
        return Err(ApiError::not_found("Brand not found"));
    };

    if !query.cascade() {
        let usage = service.usage(brand_id).await?;
        if !usage.is_empty() {
            return Ok(cascade_required(usage));
        }
    }

    match service.delete_with_dependents(brand_id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Err(ApiError::not_found("Brand not found or already deleted.")),
        Err(e) => return Err(ApiError::from_database(e, "Failed to delete brand")),
    }

    tracing::info!("[API Brands DELETE] Brand {} deleted by {}", brand_id, user.id);
    Ok(success_with(json!({
        "message": format!(
            "Brand \"{}\" and its direct dependents have been scheduled for deletion.",
            brand_name(&brand)
        )
    }))
    .into_response())
}
