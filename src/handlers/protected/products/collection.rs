use axum::{
    extract::State,
    Extension,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::Product;
use crate::error::ApiError;
use crate::handlers::utils::ensure;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult};
use crate::services::product_service::{product_write_error, ProductInput};
use crate::services::ProductService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub master_brand_id: Option<Uuid>,
}

/// GET /api/products[?master_brand_id=]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Vec<Product>> {
    let service = ProductService::new(&state.db);

    let visible = if user.is_admin() {
        None
    } else {
        Some(state.permissions().permitted_brand_ids(&user).await?)
    };
    let products = service
        .list(query.master_brand_id, visible.as_deref())
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to fetch products"))?;

    Ok(ApiResponse::success(products))
}

/// POST /api/products
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Product> {
    let input = ProductInput::for_create(&body)?;
    let (Some(name), Some(master_brand_id)) = (input.name.as_deref(), input.master_brand_id) else {
        return Err(ApiError::bad_request("Master Brand ID is required."));
    };

    ensure(
        state.permissions().can_manage_products(&user, master_brand_id).await?,
        "You do not have permission to create a product for this brand.",
    )?;

    let description = input.description.clone().flatten();
    let product = ProductService::new(&state.db)
        .create(name, description.as_deref(), master_brand_id)
        .await
        .map_err(|e| product_write_error(e, "Failed to create product"))?;

    tracing::info!("[API Products POST] Created product {} under {}", product.id, master_brand_id);
    Ok(ApiResponse::created(product))
}
