use std::str::FromStr;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{Claim, ClaimLevel, ClaimType, CLAIM_COLUMNS};
use crate::database::repository::{insert_json, update_json};
use crate::database::manager::UNIQUE_VIOLATION;
use crate::database::{DatabaseError, Repository};
use crate::error::ApiError;

pub const DUPLICATE_CLAIM_MESSAGE: &str =
    "This update would result in a duplicate claim (text, type, level, entity, country combination).";

/// Query-string filters for the claim list
#[derive(Debug, Default, Deserialize)]
pub struct ClaimFilter {
    pub level: Option<String>,
    pub claim_type: Option<String>,
    pub country_code: Option<String>,
    pub master_brand_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

impl ClaimFilter {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(level) = &self.level {
            ClaimLevel::from_str(level).map_err(|_| ApiError::bad_request("Invalid level."))?;
        }
        if let Some(claim_type) = &self.claim_type {
            ClaimType::from_str(claim_type).map_err(|_| ApiError::bad_request("Invalid claim_type."))?;
        }
        Ok(())
    }
}

/// A validated new claim, ready to insert
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub level: ClaimLevel,
    /// Id in the level's reference column
    pub reference: Uuid,
    pub record: Map<String, Value>,
}

impl NewClaim {
    pub fn from_body(body: &Map<String, Value>, created_by: Uuid) -> Result<Self, ApiError> {
        let claim_text = required_text(body, "claim_text", "Claim text must be a non-empty string.")?;
        let claim_type = body
            .get("claim_type")
            .and_then(Value::as_str)
            .and_then(|s| ClaimType::from_str(s).ok())
            .ok_or_else(|| ApiError::bad_request("Invalid claim_type."))?;
        let level = body
            .get("level")
            .and_then(Value::as_str)
            .and_then(|s| ClaimLevel::from_str(s).ok())
            .ok_or_else(|| ApiError::bad_request("Invalid level."))?;
        let country_code = required_text(body, "country_code", "Country code must be a non-empty string.")?;
        let description = optional_description(body)?;

        let column = level.reference_column();
        let reference = body
            .get(column)
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                ApiError::bad_request(format!("A valid {column} is required for {}-level claims.", level.as_str()))
            })?;

        let mut record = Map::new();
        record.insert("claim_text".into(), json!(claim_text));
        record.insert("claim_type".into(), json!(claim_type.as_str()));
        record.insert("level".into(), json!(level.as_str()));
        record.insert(column.into(), json!(reference));
        record.insert("country_code".into(), json!(country_code));
        if let Some(description) = description {
            record.insert("description".into(), json!(description));
        }
        record.insert("created_by".into(), json!(created_by));

        Ok(Self {
            level,
            reference,
            record,
        })
    }
}

/// Updatable claim columns from a request body. Level and the reference ids
/// are fixed once a claim exists.
pub fn claim_changes(body: &Map<String, Value>) -> Result<Map<String, Value>, ApiError> {
    let mut changes = Map::new();

    if body.contains_key("claim_text") {
        let text = required_text(body, "claim_text", "Claim text must be a non-empty string.")?;
        changes.insert("claim_text".into(), json!(text));
    }
    if let Some(claim_type) = body.get("claim_type") {
        let parsed = claim_type
            .as_str()
            .and_then(|s| ClaimType::from_str(s).ok())
            .ok_or_else(|| ApiError::bad_request("Invalid claim_type."))?;
        changes.insert("claim_type".into(), json!(parsed.as_str()));
    }
    if let Some(description) = optional_description(body)? {
        changes.insert("description".into(), json!(description));
    }
    if body.contains_key("country_code") {
        let code = required_text(body, "country_code", "Country code must be a non-empty string.")?;
        changes.insert("country_code".into(), json!(code));
    }

    if changes.is_empty() {
        return Err(ApiError::bad_request("No updatable fields provided."));
    }
    Ok(changes)
}

fn required_text(body: &Map<String, Value>, field: &str, message: &str) -> Result<String, ApiError> {
    match body.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ApiError::bad_request(message)),
    }
}

/// `Some(None)` when the body sets description to null
fn optional_description(body: &Map<String, Value>) -> Result<Option<Option<String>>, ApiError> {
    match body.get("description") {
        None => Ok(None),
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(s)) => Ok(Some(Some(s.trim().to_string()))),
        Some(_) => Err(ApiError::bad_request("Description must be a string or null.")),
    }
}

pub fn claim_write_error(err: DatabaseError, context: &str) -> ApiError {
    claim_constraint_error(err.code().as_deref()).unwrap_or_else(|| ApiError::from_database(err, context))
}

/// Claim-specific message for a constraint SQLSTATE, if there is one
fn claim_constraint_error(code: Option<&str>) -> Option<ApiError> {
    match code? {
        UNIQUE_VIOLATION => Some(ApiError::conflict(DUPLICATE_CLAIM_MESSAGE)),
        _ => None,
    }
}

pub struct ClaimService<'a> {
    pool: &'a PgPool,
}

impl<'a> ClaimService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    fn repository(&self) -> Result<Repository<'a, Claim>, DatabaseError> {
        Repository::with_columns("claims", CLAIM_COLUMNS, self.pool)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Claim>, DatabaseError> {
        self.repository()?.select_one(id).await
    }

    /// Claims matching `filter`. With `reader` set, only claims that user may
    /// read: their own, ingredient-level, or those on a brand they hold any
    /// role on (through the product or master claim brand link).
    pub async fn list(&self, filter: &ClaimFilter, reader: Option<Uuid>) -> Result<Vec<Claim>, DatabaseError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {CLAIM_COLUMNS} FROM claims c WHERE TRUE"));

        if let Some(level) = &filter.level {
            query.push(" AND c.level::text = ").push_bind(level.clone());
        }
        if let Some(claim_type) = &filter.claim_type {
            query.push(" AND c.claim_type::text = ").push_bind(claim_type.clone());
        }
        if let Some(country_code) = &filter.country_code {
            query.push(" AND c.country_code = ").push_bind(country_code.clone());
        }
        if let Some(master_brand_id) = filter.master_brand_id {
            query.push(" AND c.master_brand_id = ").push_bind(master_brand_id);
        }
        if let Some(product_id) = filter.product_id {
            query.push(" AND c.product_id = ").push_bind(product_id);
        }

        if let Some(user_id) = reader {
            query
                .push(" AND (c.created_by = ")
                .push_bind(user_id)
                .push(
                    " OR c.level::text = 'ingredient' OR EXISTS ( \
                       SELECT 1 FROM user_brand_permissions ubp \
                       JOIN master_claim_brands m ON m.mixerai_brand_id = ubp.brand_id \
                       WHERE ubp.user_id = ",
                )
                .push_bind(user_id)
                .push(
                    " AND m.id = CASE c.level::text \
                         WHEN 'brand' THEN c.master_brand_id \
                         WHEN 'product' THEN (SELECT p.master_brand_id FROM products p WHERE p.id = c.product_id) \
                       END))",
                );
        }

        query.push(" ORDER BY c.created_at DESC");
        let claims = query.build_query_as::<Claim>().fetch_all(self.pool).await?;
        Ok(claims)
    }

    pub async fn create(&self, claim: &NewClaim) -> Result<Map<String, Value>, DatabaseError> {
        insert_json(self.pool, "claims", &claim.record).await
    }

    pub async fn update(&self, id: Uuid, changes: &Map<String, Value>) -> Result<Option<Map<String, Value>>, DatabaseError> {
        update_json(self.pool, "claims", id, changes).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, DatabaseError> {
        self.repository()?.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn no_updatable_fields_is_rejected() {
        let err = claim_changes(&body(json!({"level": "brand", "product_id": Uuid::new_v4()}))).unwrap_err();
        assert_eq!(err.message(), "No updatable fields provided.");
    }

    #[test]
    fn update_fields_are_validated_and_trimmed() {
        let changes = claim_changes(&body(json!({
            "claim_text": "  Rich in fibre ",
            "claim_type": "allowed",
            "description": null,
            "country_code": " GB "
        })))
        .unwrap();
        assert_eq!(changes["claim_text"], "Rich in fibre");
        assert_eq!(changes["description"], Value::Null);
        assert_eq!(changes["country_code"], "GB");

        assert_eq!(claim_changes(&body(json!({"claim_text": " "}))).unwrap_err().status_code(), 400);
        assert_eq!(
            claim_changes(&body(json!({"claim_type": "maybe"}))).unwrap_err().message(),
            "Invalid claim_type."
        );
        assert_eq!(
            claim_changes(&body(json!({"description": 4}))).unwrap_err().message(),
            "Description must be a string or null."
        );
        assert!(claim_changes(&body(json!({"country_code": ""}))).is_err());
    }

    #[test]
    fn new_claim_needs_reference_for_its_level() {
        let user = Uuid::new_v4();
        let product = Uuid::new_v4();
        let claim = NewClaim::from_body(
            &body(json!({
                "claim_text": "Contains oats",
                "claim_type": "mandatory",
                "level": "product",
                "product_id": product.to_string(),
                "country_code": "GB"
            })),
            user,
        )
        .unwrap();
        assert_eq!(claim.level, ClaimLevel::Product);
        assert_eq!(claim.reference, product);
        assert_eq!(claim.record["created_by"], json!(user));
        assert!(!claim.record.contains_key("description"));

        let err = NewClaim::from_body(
            &body(json!({
                "claim_text": "Contains oats",
                "claim_type": "mandatory",
                "level": "brand",
                "product_id": product.to_string(),
                "country_code": "GB"
            })),
            user,
        )
        .unwrap_err();
        assert_eq!(err.message(), "A valid master_brand_id is required for brand-level claims.");
    }

    #[test]
    fn filter_rejects_unknown_enums() {
        let filter = ClaimFilter {
            level: Some("global".into()),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
        assert!(ClaimFilter::default().validate().is_ok());
    }

    #[test]
    fn duplicate_claims_map_to_conflict() {
        let err = claim_constraint_error(Some("23505")).unwrap();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), DUPLICATE_CLAIM_MESSAGE);
        assert!(claim_constraint_error(Some("23503")).is_none());
        assert!(claim_constraint_error(None).is_none());
    }

    #[test]
    fn other_claim_write_failures_keep_context() {
        let err = claim_write_error(DatabaseError::Sqlx(sqlx::Error::Protocol("boom".into())), "Failed to update claim");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Failed to update claim");
    }
}
