use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Product;
use crate::database::manager::{FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;

const PRODUCT_COLUMNS: &str = "id, name, description, master_brand_id, created_at, updated_at";

/// Validated product fields from a request body
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub master_brand_id: Option<Uuid>,
}

impl ProductInput {
    /// Create: `name` and `master_brand_id` are required
    pub fn for_create(body: &Map<String, Value>) -> Result<Self, ApiError> {
        let input = Self::parse(body)?;
        if input.name.is_none() {
            return Err(ApiError::bad_request("Product name is required and must be a non-empty string."));
        }
        if input.master_brand_id.is_none() {
            return Err(ApiError::bad_request("Master Brand ID is required."));
        }
        Ok(input)
    }

    /// Update: any subset, but at least one field
    pub fn for_update(body: &Map<String, Value>) -> Result<Self, ApiError> {
        let input = Self::parse(body)?;
        if input.name.is_none() && input.description.is_none() && input.master_brand_id.is_none() {
            return Err(ApiError::bad_request("No updatable fields provided."));
        }
        Ok(input)
    }

    fn parse(body: &Map<String, Value>) -> Result<Self, ApiError> {
        let name = match body.get("name") {
            None => None,
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(_) => {
                return Err(ApiError::bad_request("Product name is required and must be a non-empty string."))
            }
        };

        let master_brand_id = match body.get("master_brand_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(
                Uuid::parse_str(s).map_err(|_| ApiError::bad_request("Master Brand ID must be a valid UUID."))?,
            ),
            Some(_) => return Err(ApiError::bad_request("Master Brand ID is required.")),
        };

        // blank descriptions are stored as null
        let description = match body.get("description") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
            Some(_) => return Err(ApiError::bad_request("Description must be a string if provided.")),
        };

        Ok(Self {
            name,
            description,
            master_brand_id,
        })
    }
}

/// Maps write failures to the product-specific messages
pub fn product_write_error(err: DatabaseError, context: &str) -> ApiError {
    product_constraint_error(err.code().as_deref()).unwrap_or_else(|| ApiError::from_database(err, context))
}

fn product_constraint_error(code: Option<&str>) -> Option<ApiError> {
    match code? {
        UNIQUE_VIOLATION => Some(ApiError::conflict("A product with this name already exists for this brand.")),
        FOREIGN_KEY_VIOLATION => Some(ApiError::bad_request(
            "Invalid Master Brand ID. The specified brand does not exist.",
        )),
        _ => None,
    }
}

pub struct ProductService<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Result<Repository<'a, Product>, DatabaseError> {
        Repository::with_columns("products", PRODUCT_COLUMNS, self.pool)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        self.repository()?.select_one(id).await
    }

    /// Ordered by name. `visible_brands` limits the result to products whose
    /// master claim brand is linked to one of those core brands.
    pub async fn list(
        &self,
        master_brand_id: Option<Uuid>,
        visible_brands: Option<&[Uuid]>,
    ) -> Result<Vec<Product>, DatabaseError> {
        let Some(brand_ids) = visible_brands else {
            return self
                .repository()?
                .select_all(master_brand_id.map(|id| ("master_brand_id", id)), "name")
                .await;
        };
        if brand_ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(
            "SELECT p.id, p.name, p.description, p.master_brand_id, p.created_at, p.updated_at \
             FROM products p \
             JOIN master_claim_brands m ON m.id = p.master_brand_id \
             WHERE m.mixerai_brand_id = ANY($1) AND ($2::uuid IS NULL OR p.master_brand_id = $2) \
             ORDER BY p.name",
        )
        .bind(brand_ids)
        .bind(master_brand_id)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    pub async fn create(&self, name: &str, description: Option<&str>, master_brand_id: Uuid) -> Result<Product, DatabaseError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, master_brand_id) VALUES ($1, $2, $3) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(master_brand_id)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, input: &ProductInput) -> Result<Option<Product>, DatabaseError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET \
                name = COALESCE($2, name), \
                description = CASE WHEN $3 THEN $4 ELSE description END, \
                master_brand_id = COALESCE($5, master_brand_id), \
                updated_at = now() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.description.is_some())
        .bind(input.description.clone().flatten())
        .bind(input.master_brand_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, DatabaseError> {
        self.repository()?.delete(id).await
    }
}
