use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{success_with, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDescriptionRequest {
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub input_fields: Vec<String>,
    #[serde(default)]
    pub output_fields: Vec<String>,
}

/// POST /api/ai/generate-template-description `{ templateName, inputFields, outputFields }`
pub async fn post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TemplateDescriptionRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(name) = request.template_name.as_deref().filter(|n| !n.trim().is_empty()) else {
        return Err(ApiError::bad_request("Template name is required"));
    };

    let description = state
        .generators
        .template_description(name, &request.input_fields, &request.output_fields)
        .await?;
    if description.trim().is_empty() {
        return Err(ApiError::service_unavailable(
            "AI failed to generate template description. Please try again later.",
        ));
    }

    Ok(success_with(json!({ "description": description })))
}
