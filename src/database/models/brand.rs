use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Brand fields fed into copywriting prompts
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct BrandContext {
    pub name: String,
    pub brand_identity: Option<String>,
    pub tone_of_voice: Option<String>,
    pub guardrails: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
}
