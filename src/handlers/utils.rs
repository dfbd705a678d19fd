use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

/// Path ids arrive as strings so a malformed one gets a JSON 400, not axum's plain-text rejection
pub fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid {entity} ID format.")))
}

/// String entries of an array field; `None` when the field is absent or not an array
pub fn string_list(body: &Map<String, Value>, field: &str) -> Option<Vec<String>> {
    body.get(field).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// `email` of each `{email}` object in `admins`
pub fn admin_emails(body: &Map<String, Value>) -> Option<Vec<String>> {
    body.get("admins").and_then(Value::as_array).map(|admins| {
        admins
            .iter()
            .filter_map(|admin| admin.get("email").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    })
}

pub fn ensure(allowed: bool, message: &str) -> Result<(), ApiError> {
    if allowed {
        Ok(())
    } else {
        Err(ApiError::forbidden(message))
    }
}
