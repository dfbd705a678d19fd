use axum::{
    extract::State,
    Extension,
};
use serde_json::{Map, Value};

use crate::auth::AuthUser;
use crate::database::models::{Claim, ClaimLevel};
use crate::error::ApiError;
use crate::handlers::utils::ensure;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult};
use crate::services::claim_service::{claim_write_error, ClaimFilter, NewClaim};
use crate::services::{ClaimService, ProductService};
use crate::state::AppState;

/// GET /api/claims - Filtered claims the caller can read
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(filter): ApiQuery<ClaimFilter>,
) -> ApiResult<Vec<Claim>> {
    filter.validate()?;
    let reader = (!user.is_admin()).then_some(user.id);
    let claims = ClaimService::new(&state.db)
        .list(&filter, reader)
        .await
        .map_err(|e| ApiError::from_database(e, "Failed to fetch claims"))?;
    Ok(ApiResponse::success(claims))
}

/// POST /api/claims - Create a claim at brand, product or ingredient level
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> ApiResult<Map<String, Value>> {
    let claim = NewClaim::from_body(&body, user.id)?;
    let permissions = state.permissions();

    let allowed = match claim.level {
        ClaimLevel::Brand => permissions.can_manage_products(&user, claim.reference).await?,
        ClaimLevel::Product => {
            let Some(product) = ProductService::new(&state.db).find(claim.reference).await? else {
                return Err(ApiError::bad_request("Invalid product_id. The specified product does not exist."));
            };
            permissions.can_manage_products(&user, product.master_brand_id).await?
        }
        ClaimLevel::Ingredient => user.is_admin(),
    };
    ensure(allowed, "You do not have permission to create this claim.")?;

    let created = ClaimService::new(&state.db)
        .create(&claim)
        .await
        .map_err(|e| claim_write_error(e, "Failed to create claim"))?;

    tracing::info!("[API Claims POST] {}-level claim created by {}", claim.level.as_str(), user.id);
    Ok(ApiResponse::created(created))
}
