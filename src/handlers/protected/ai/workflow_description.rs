use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::ai::generators::WorkflowDetails;
use crate::error::ApiError;
use crate::middleware::{success_with, ApiJson};
use crate::state::AppState;

/// Field errors in the `{ field: { _errors: [...] } }` shape clients already read
fn field_error(field: &str, message: &str) -> Value {
    let mut details = json!({ "_errors": [] });
    details[field] = json!({ "_errors": [message] });
    details
}

fn validate(body: Value) -> Result<WorkflowDetails, ApiError> {
    let invalid = |details| ApiError::validation_error("Invalid request body", Some(details));

    match body.get("workflowName") {
        Some(Value::String(name)) if !name.is_empty() => {}
        Some(Value::String(_)) => return Err(invalid(field_error("workflowName", "Workflow name is required"))),
        Some(_) => return Err(invalid(field_error("workflowName", "Expected string"))),
        None => return Err(invalid(field_error("workflowName", "Required"))),
    }

    serde_json::from_value(body).map_err(|e| invalid(json!({ "_errors": [e.to_string()] })))
}

/// POST /api/ai/generate-workflow-description
pub async fn post(State(state): State<AppState>, ApiJson(body): ApiJson<Value>) -> Result<Json<Value>, ApiError> {
    let details = validate(body)?;

    let unavailable = || ApiError::service_unavailable("AI failed to generate workflow description. Please try again later.");
    let description = state.generators.workflow_description(&details).await.map_err(|e| {
        tracing::error!("[API_GENERATE_WORKFLOW_DESCRIPTION] AI generation failed: {}", e);
        unavailable()
    })?;
    if description.is_empty() {
        tracing::error!("[API_GENERATE_WORKFLOW_DESCRIPTION] AI returned an empty description");
        return Err(unavailable());
    }

    Ok(success_with(json!({ "description": description })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_name_is_required() {
        for body in [json!({}), json!({"workflowName": ""}), json!({"workflowName": 3})] {
            let err = validate(body).unwrap_err();
            assert_eq!(err.message(), "Invalid request body");
            assert!(err.to_json()["details"]["workflowName"]["_errors"].is_array());
        }
    }

    #[test]
    fn optional_fields_are_type_checked() {
        let err = validate(json!({"workflowName": "Launch", "stepNames": "draft"})).unwrap_err();
        assert_eq!(err.status_code(), 400);

        let details = validate(json!({"workflowName": "Launch", "stepNames": ["Draft", "Review"]})).unwrap();
        assert_eq!(details.step_names.unwrap().len(), 2);
    }
}
