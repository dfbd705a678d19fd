use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{flatten_template_row, TemplateFields};
use crate::database::repository::{insert_json, select_json, update_json};
use crate::database::DatabaseError;
use crate::error::ApiError;

/// Template fields accepted on create and update
#[derive(Debug, Clone)]
pub struct TemplateInput {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub fields: TemplateFields,
    /// `Some` only when the body names a brand (possibly null)
    pub brand_id: Option<Option<Uuid>>,
}

impl TemplateInput {
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, ApiError> {
        let name = body.get("name").and_then(Value::as_str).filter(|s| !s.is_empty());
        let input_fields = body.get("inputFields").and_then(Value::as_array);
        let output_fields = body.get("outputFields").and_then(Value::as_array);

        let (Some(name), Some(input_fields), Some(output_fields)) = (name, input_fields, output_fields) else {
            return Err(ApiError::bad_request("Name, inputFields, and outputFields are required"));
        };

        let brand_id = match body.get("brand_id") {
            None => None,
            Some(Value::Null) => Some(None),
            Some(Value::String(s)) => {
                Some(Some(Uuid::parse_str(s).map_err(|_| ApiError::bad_request("brand_id must be a valid UUID."))?))
            }
            Some(_) => return Err(ApiError::bad_request("brand_id must be a valid UUID.")),
        };

        Ok(Self {
            name: name.to_string(),
            description: body.get("description").and_then(Value::as_str).map(str::to_string),
            icon: body
                .get("icon")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            fields: TemplateFields {
                input_fields: input_fields.clone(),
                output_fields: output_fields.clone(),
            },
            brand_id,
        })
    }

    /// Column values; `description` is whatever the caller settled on
    pub fn record(&self, description: &str) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("name".into(), json!(self.name));
        record.insert("description".into(), json!(description));
        record.insert("icon".into(), json!(self.icon));
        record.insert("fields".into(), json!(self.fields));
        if let Some(brand_id) = self.brand_id {
            record.insert("brand_id".into(), json!(brand_id));
        }
        record
    }
}

pub struct TemplateService<'a> {
    pool: &'a PgPool,
}

impl<'a> TemplateService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Map<String, Value>>, DatabaseError> {
        Ok(select_json(self.pool, "content_templates", id).await?.map(flatten_template_row))
    }

    pub async fn list(&self, brand_id: Option<Uuid>) -> Result<Vec<Map<String, Value>>, DatabaseError> {
        let rows: Vec<Value> = sqlx::query_scalar(
            "SELECT row_to_json(t) FROM content_templates t \
             WHERE ($1::uuid IS NULL OR t.brand_id = $1) ORDER BY t.name",
        )
        .bind(brand_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(flatten_template_row(map)),
                _ => None,
            })
            .collect())
    }

    pub async fn create(&self, mut record: Map<String, Value>, created_by: Uuid) -> Result<Map<String, Value>, DatabaseError> {
        record.insert("created_by".into(), json!(created_by));
        Ok(flatten_template_row(insert_json(self.pool, "content_templates", &record).await?))
    }

    pub async fn update(&self, id: Uuid, record: &Map<String, Value>) -> Result<Option<Map<String, Value>>, DatabaseError> {
        Ok(update_json(self.pool, "content_templates", id, record).await?.map(flatten_template_row))
    }

    /// Removes the template and detaches content that used it, in one RPC
    pub async fn delete_and_update_content(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("SELECT delete_template_and_update_content($1)")
            .bind(id)
            .execute(self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.raised_message().is_some_and(|m| m.contains("Template not found")) {
                    Err(DatabaseError::NotFound(format!("content_templates {id}")))
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn requires_name_and_both_field_lists() {
        for value in [
            json!({"inputFields": [], "outputFields": []}),
            json!({"name": "", "inputFields": [], "outputFields": []}),
            json!({"name": "Blog", "outputFields": []}),
            json!({"name": "Blog", "inputFields": [], "outputFields": "x"}),
        ] {
            let err = TemplateInput::from_body(&body(value)).unwrap_err();
            assert_eq!(err.message(), "Name, inputFields, and outputFields are required");
        }
    }

    #[test]
    fn record_nests_fields_and_keeps_brand_only_when_given() {
        let input = TemplateInput::from_body(&body(json!({
            "name": "Blog",
            "icon": "",
            "inputFields": [{"name": "topic"}],
            "outputFields": [{"name": "body"}]
        })))
        .unwrap();
        let record = input.record("Writes blog posts");
        assert_eq!(record["fields"]["inputFields"][0]["name"], "topic");
        assert_eq!(record["icon"], Value::Null);
        assert!(!record.contains_key("brand_id"));

        let cleared = TemplateInput::from_body(&body(json!({
            "name": "Blog", "inputFields": [], "outputFields": [], "brand_id": null
        })))
        .unwrap();
        assert_eq!(cleared.record("")["brand_id"], Value::Null);
    }

    #[test]
    fn rejects_malformed_brand_id() {
        let err = TemplateInput::from_body(&body(json!({
            "name": "Blog", "inputFields": [], "outputFields": [], "brand_id": "abc"
        })))
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
