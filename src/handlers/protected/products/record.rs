use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::auth::AuthUser;
use crate::database::models::Product;
use crate::error::ApiError;
use crate::handlers::utils::{ensure, parse_id};
use crate::middleware::{success_with, ApiJson, ApiResponse, ApiResult};
use crate::services::product_service::{product_write_error, ProductInput};
use crate::services::ProductService;
use crate::state::AppState;

/// GET /api/products/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Product> {
    let product_id = parse_id(&id, "product")?;
    let Some(product) = ProductService::new(&state.db).find(product_id).await? else {
        return Err(ApiError::not_found("Product not found."));
    };

    let readable = if user.is_admin() {
        true
    } else {
        let permissions = state.permissions();
        match permissions.core_brand_for_master(product.master_brand_id).await {
            Some(brand_id) => permissions.can_read_brand(&user, brand_id).await?,
            None => false,
        }
    };
    ensure(readable, "You do not have permission to view this product.")?;

    Ok(ApiResponse::success(product))
}

/// PUT /api/products/:id - Moving a product needs rights on both master brands
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Product> {
    let product_id = parse_id(&id, "product")?;
    let input = ProductInput::for_update(&body)?;

    let service = ProductService::new(&state.db);
    let Some(existing) = service.find(product_id).await? else {
        return Err(ApiError::not_found("Product not found."));
    };

    let permissions = state.permissions();
    let mut allowed = permissions.can_manage_products(&user, existing.master_brand_id).await?;
    if let Some(target) = input.master_brand_id.filter(|target| *target != existing.master_brand_id) {
        allowed = allowed && permissions.can_manage_products(&user, target).await?;
    }
    ensure(allowed, "You do not have permission to update this product.")?;

    let Some(product) = service
        .update(product_id, &input)
        .await
        .map_err(|e| product_write_error(e, "Failed to update product"))?
    else {
        return Err(ApiError::not_found("Product not found."));
    };

    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let product_id = parse_id(&id, "product")?;
    let service = ProductService::new(&state.db);
    let Some(existing) = service.find(product_id).await? else {
        return Err(ApiError::not_found("Product not found."));
    };

    ensure(
        state.permissions().can_manage_products(&user, existing.master_brand_id).await?,
        "You do not have permission to delete this product.",
    )?;

    let removed = service
        .delete(product_id)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to delete product"))?;
    if removed == 0 {
        return Err(ApiError::not_found("Product not found."));
    }

    tracing::info!("[API Products DELETE /{}] Deleted by {}", product_id, user.id);
    Ok(success_with(json!({ "message": "Product deleted successfully." })))
}
