use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::{admit, finish_run, parse_body, record_failure};
use crate::ai::locale::{country_for_language, locale_for_url};
use crate::auth::AuthUser;
use crate::database::models::ToolName;
use crate::error::ApiError;
use crate::state::AppState;

const TOOL: ToolName = ToolName::AltTextGenerator;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AltTextResult {
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AltTextResult {
    fn failed(image_url: &str, error: impl Into<String>) -> Self {
        Self {
            image_url: image_url.to_string(),
            alt_text: None,
            error: Some(error.into()),
        }
    }
}

/// Language and country for one image: the requested language wins, then
/// the image host's TLD. `None` when a non-data URL does not parse.
fn image_locale(image_url: &str, requested: Option<&str>) -> Option<(String, String)> {
    if !image_url.starts_with("data:") && url::Url::parse(image_url).is_err() {
        return None;
    }
    Some(match requested {
        Some(language) => (language.to_string(), country_for_language(language).to_string()),
        None => {
            let locale = locale_for_url(image_url);
            (locale.language.to_string(), locale.country.to_string())
        }
    })
}

/// POST /api/tools/alt-text-generator `{ imageUrls: [...], language? }`
pub async fn post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    admit(&state, &user, TOOL, &state.limits.alt_text, &headers, peer.map(|ConnectInfo(addr)| addr)).await?;
    let inputs = parse_body(&state, &user, TOOL, &body).await?;

    let image_urls: Vec<Value> = inputs
        .get("imageUrls")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if image_urls.is_empty() {
        let message = "An array of image URLs is required";
        record_failure(&state, &user, TOOL, Value::Object(inputs), json!({ "error": message }), message).await;
        return Err(ApiError::bad_request(message));
    }

    let requested = inputs
        .get("language")
        .and_then(Value::as_str)
        .filter(|l| !l.is_empty())
        .map(str::to_string);

    let mut results = Vec::with_capacity(image_urls.len());
    let mut run_error: Option<String> = None;

    for entry in &image_urls {
        let image_url = entry.as_str().unwrap_or_default();
        let Some((language, country)) = image_locale(image_url, requested.as_deref()) else {
            tracing::error!("[AltTextGen] Invalid image URL format: {}", image_url);
            results.push(AltTextResult::failed(image_url, "Invalid image URL format."));
            run_error.get_or_insert_with(|| "One or more images failed processing.".to_string());
            continue;
        };

        tokio::time::sleep(state.ai_delay).await;
        match state.generators.alt_text(image_url, &language, &country).await {
            Ok(alt_text) => results.push(AltTextResult {
                image_url: image_url.to_string(),
                alt_text: Some(alt_text),
                error: None,
            }),
            Err(e) => {
                tracing::error!("[AltTextGen] Generation failed for {} ({}/{}): {}", image_url, language, country, e);
                results.push(AltTextResult::failed(image_url, e.to_string()));
                run_error.get_or_insert_with(|| "One or more images failed AI generation.".to_string());
            }
        }
    }

    let response = finish_run(&state, &user, TOOL, inputs, json!(results), run_error).await;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_language_overrides_tld() {
        assert_eq!(
            image_locale("https://cdn.example.fr/a.png", Some("de")),
            Some(("de".to_string(), "DE".to_string()))
        );
        assert_eq!(
            image_locale("https://cdn.example.fr/a.png", None),
            Some(("fr".to_string(), "FR".to_string()))
        );
        assert_eq!(
            image_locale("https://cdn.example.com/a.png", Some("xx")),
            Some(("xx".to_string(), "US".to_string()))
        );
    }

    #[test]
    fn data_urls_use_default_and_bad_urls_fail() {
        assert_eq!(
            image_locale("data:image/png;base64,AAAA", None),
            Some(("en".to_string(), "US".to_string()))
        );
        assert_eq!(image_locale("not a url", None), None);
        assert_eq!(image_locale("", Some("fr")), None);
    }

    #[test]
    fn failed_items_omit_alt_text() {
        let value = serde_json::to_value(AltTextResult::failed("x", "Invalid image URL format.")).unwrap();
        assert_eq!(value, json!({"imageUrl": "x", "error": "Invalid image URL format."}));
    }
}
