use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccessLookup, ClaimContext};
use crate::database::models::ClaimLevel;
use crate::database::DatabaseError;

/// `AccessLookup` over the live tables
#[derive(Clone)]
pub struct PgAccessLookup {
    pool: PgPool,
}

impl PgAccessLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessLookup for PgAccessLookup {
    async fn core_brand_of_master(&self, master_brand_id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let linked: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT mixerai_brand_id FROM master_claim_brands WHERE id = $1")
                .bind(master_brand_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(linked.flatten())
    }

    async fn master_brand_of_product(&self, product_id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let master: Option<Option<Uuid>> = sqlx::query_scalar("SELECT master_brand_id FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(master.flatten())
    }

    async fn claim_context(&self, claim_id: Uuid) -> Result<Option<ClaimContext>, DatabaseError> {
        let row: Option<(String, Option<Uuid>, Option<Uuid>, Option<Uuid>)> = sqlx::query_as(
            "SELECT level::text, master_brand_id, product_id, created_by FROM claims WHERE id = $1",
        )
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((level, master_brand_id, product_id, created_by)) = row else {
            return Ok(None);
        };
        let level = level.parse::<ClaimLevel>().map_err(|e| {
            DatabaseError::Sqlx(sqlx::Error::ColumnDecode {
                index: "level".into(),
                source: Box::new(e),
            })
        })?;

        Ok(Some(ClaimContext {
            level,
            master_brand_id,
            product_id,
            created_by,
        }))
    }

    async fn brand_role(&self, user_id: Uuid, brand_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role::text FROM user_brand_permissions WHERE user_id = $1 AND brand_id = $2 LIMIT 1",
        )
        .bind(user_id)
        .bind(brand_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn permitted_brand_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT brand_id FROM user_brand_permissions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
