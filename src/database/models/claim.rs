use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::UnknownVariant;

/// Select list for `claims`; the enum columns come back as text
pub const CLAIM_COLUMNS: &str = "id, claim_text, claim_type::text AS claim_type, level::text AS level, \
     master_brand_id, product_id, ingredient_id, country_code, description, created_by, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    Allowed,
    Disallowed,
    Mandatory,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Allowed => "allowed",
            ClaimType::Disallowed => "disallowed",
            ClaimType::Mandatory => "mandatory",
        }
    }
}

impl FromStr for ClaimType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allowed" => Ok(ClaimType::Allowed),
            "disallowed" => Ok(ClaimType::Disallowed),
            "mandatory" => Ok(ClaimType::Mandatory),
            other => Err(UnknownVariant {
                kind: "claim_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Which entity a claim is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimLevel {
    Brand,
    Product,
    Ingredient,
}

impl ClaimLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimLevel::Brand => "brand",
            ClaimLevel::Product => "product",
            ClaimLevel::Ingredient => "ingredient",
        }
    }

    /// Name of the reference column that must be set for this level
    pub fn reference_column(&self) -> &'static str {
        match self {
            ClaimLevel::Brand => "master_brand_id",
            ClaimLevel::Product => "product_id",
            ClaimLevel::Ingredient => "ingredient_id",
        }
    }
}

impl FromStr for ClaimLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brand" => Ok(ClaimLevel::Brand),
            "product" => Ok(ClaimLevel::Product),
            "ingredient" => Ok(ClaimLevel::Ingredient),
            other => Err(UnknownVariant {
                kind: "claim level",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub claim_text: String,
    pub claim_type: ClaimType,
    pub level: ClaimLevel,
    pub master_brand_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub ingredient_id: Option<Uuid>,
    pub country_code: String,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, PgRow> for Claim {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let claim_type: String = row.try_get("claim_type")?;
        let level: String = row.try_get("level")?;

        Ok(Self {
            id: row.try_get("id")?,
            claim_text: row.try_get("claim_text")?,
            claim_type: claim_type.parse().map_err(|e| decode_error("claim_type", e))?,
            level: level.parse().map_err(|e| decode_error("level", e))?,
            master_brand_id: row.try_get("master_brand_id")?,
            product_id: row.try_get("product_id")?,
            ingredient_id: row.try_get("ingredient_id")?,
            country_code: row.try_get("country_code")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn decode_error(column: &str, err: UnknownVariant) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_type_parses_only_known_values() {
        assert_eq!("mandatory".parse::<ClaimType>().unwrap(), ClaimType::Mandatory);
        assert!("required".parse::<ClaimType>().is_err());
        assert!("Allowed".parse::<ClaimType>().is_err());
    }

    #[test]
    fn level_names_its_reference_column() {
        assert_eq!(ClaimLevel::Brand.reference_column(), "master_brand_id");
        assert_eq!(ClaimLevel::Product.reference_column(), "product_id");
        assert_eq!("ingredient".parse::<ClaimLevel>().unwrap().reference_column(), "ingredient_id");
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_value(ClaimType::Disallowed).unwrap(), "disallowed");
        assert_eq!(serde_json::to_value(ClaimLevel::Product).unwrap(), "product");
    }
}
