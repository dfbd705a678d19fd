use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    AltTextGenerator,
    MetadataGenerator,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::AltTextGenerator => "alt_text_generator",
            ToolName::MetadataGenerator => "metadata_generator",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
        }
    }
}

/// Insert payload for `tool_run_history`
#[derive(Debug, Clone)]
pub struct NewToolRun {
    pub user_id: Uuid,
    pub tool_name: ToolName,
    pub inputs: Value,
    pub outputs: Value,
    pub status: RunStatus,
    pub error_message: Option<String>,
    pub brand_id: Option<Uuid>,
}
