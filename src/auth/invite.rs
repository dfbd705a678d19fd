use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthProviderConfig;

#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("invite request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invite rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Metadata attached to an invited account
#[derive(Debug, Clone, Serialize)]
pub struct InviteMetadata {
    pub role: String,
    pub invited_to_brand: Uuid,
    pub invited_as_brand_role: String,
}

#[derive(Debug, Deserialize)]
pub struct InvitedUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for the hosted auth provider's admin invite endpoint
#[derive(Clone)]
pub struct AuthAdminClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl AuthAdminClient {
    /// `None` when the provider URL or service key is missing
    pub fn from_config(config: &AuthProviderConfig) -> Option<Self> {
        let base_url = config.url.as_deref()?.trim_end_matches('/').to_string();
        let service_key = config.service_role_key.clone()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .ok()?;
        Some(Self {
            http,
            base_url,
            service_key,
        })
    }

    pub async fn invite(&self, email: &str, metadata: &InviteMetadata) -> Result<InvitedUser, InviteError> {
        let url = format!("{}/auth/v1/invite", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "email": email, "data": metadata }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InviteError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<InvitedUser>().await?)
    }
}
