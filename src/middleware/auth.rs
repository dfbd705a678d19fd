use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::auth::{validate_jwt, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Validates the access token and injects the caller as an `AuthUser` extension
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(&headers, &jar, &state.auth.cookie_name) {
        Ok(token) => token,
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    };

    let claims = match validate_jwt(&token, &state.auth.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Rejected access token: {}", e);
            return ApiError::unauthorized("Invalid or expired session").into_response();
        }
    };

    request.extensions_mut().insert(AuthUser::from(claims));
    next.run(request).await
}

/// Bearer header first, then the session cookie
fn extract_token(headers: &HeaderMap, jar: &CookieJar, cookie_name: &str) -> Result<String, &'static str> {
    if let Some(header) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = header.to_str().map_err(|_| "Invalid Authorization header format")?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or("Authorization header must use Bearer token format")?;
        if token.trim().is_empty() {
            return Err("Empty access token");
        }
        return Ok(token.trim().to_string());
    }

    jar.get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or("Authentication required")
}
