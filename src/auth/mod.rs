pub mod invite;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::GlobalRole;

/// Access-token claims as issued by the hosted auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Claims {
    pub fn new(user_id: Uuid, email: Option<String>, role: GlobalRole, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            user_metadata: UserMetadata {
                role: Some(role.as_str().to_string()),
                full_name: None,
            },
            exp,
            iat: now.timestamp(),
        }
    }
}

/// Caller identity available to every protected handler
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: GlobalRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: GlobalRole::from_metadata(claims.user_metadata.role.as_deref()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    // provider tokens carry `aud: authenticated`; audience is not part of our checks
    let mut validation = Validation::default();
    validation.validate_aud = false;

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_identity_and_role() {
        let id = Uuid::new_v4();
        let token = generate_jwt(&Claims::new(id, Some("a@b.co".into()), GlobalRole::Editor, 1), SECRET).unwrap();
        let user = AuthUser::from(validate_jwt(&token, SECRET).unwrap());
        assert_eq!(user.id, id);
        assert_eq!(user.role, GlobalRole::Editor);
        assert_eq!(user.email.as_deref(), Some("a@b.co"));
    }

    #[test]
    fn rejects_wrong_secret_and_empty_secret() {
        let token = generate_jwt(&Claims::new(Uuid::new_v4(), None, GlobalRole::Admin, 1), SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
        assert!(matches!(validate_jwt(&token, ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn rejects_expired_tokens() {
        let mut claims = Claims::new(Uuid::new_v4(), None, GlobalRole::Admin, 1);
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn missing_metadata_means_viewer() {
        let claims: Claims = serde_json::from_value(serde_json::json!({
            "sub": Uuid::new_v4(),
            "exp": Utc::now().timestamp() + 60,
            "aud": "authenticated"
        }))
        .unwrap();
        assert_eq!(AuthUser::from(claims).role, GlobalRole::Viewer);
    }
}
