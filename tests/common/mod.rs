#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use mixerai_api::ai::scraper::PageScraper;
use mixerai_api::ai::{AiError, CompletionProvider, CompletionRequest, Generators};
use mixerai_api::auth::{generate_jwt, Claims};
use mixerai_api::database::models::GlobalRole;
use mixerai_api::permissions::PgAccessLookup;
use mixerai_api::state::{AppState, AuthSettings, ToolLimits};

pub const SECRET: &str = "integration-test-secret";
pub const COOKIE: &str = "sb-access-token";
pub const TOOL_LIMIT: u32 = 10;

/// Prompts containing this marker make the scripted provider fail
pub const FAIL_MARKER: &str = "FAIL";

/// Prompts containing this marker make the provider reject the request upstream
pub const OUTAGE_MARKER: &str = "OUTAGE";

/// Deterministic completions keyed on the shape of the request
pub struct ScriptedProvider;

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        if request.user.contains(OUTAGE_MARKER) {
            return Err(AiError::Status {
                status: 502,
                body: "upstream unavailable".to_string(),
            });
        }
        if request.user.contains(FAIL_MARKER) {
            return Err(AiError::EmptyResponse);
        }
        if let Some(image_url) = &request.image_url {
            return Ok(format!("\"Alt text for {image_url}\""));
        }
        if request.json_mode {
            return Ok(r#"{"suggestions": ["Ten Breakfast Ideas", "Why Oats Matter"]}"#.to_string());
        }
        Ok("A streamlined flow from draft to approval.".to_string())
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn post_json(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn put_json(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("request failed")
    }
}

/// State wired to an unreachable database and the scripted AI provider.
/// Anything that needs Postgres fails fast instead of hanging.
fn test_state() -> AppState {
    let db = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://postgres@127.0.0.1:1/mixerai")
        .expect("lazy pool");

    AppState {
        access: Arc::new(PgAccessLookup::new(db.clone())),
        db,
        generators: Generators::new(Arc::new(ScriptedProvider)),
        scraper: PageScraper::new().expect("scraper client"),
        invites: None,
        auth: AuthSettings {
            jwt_secret: SECRET.to_string(),
            cookie_name: COOKIE.to_string(),
        },
        limits: Arc::new(ToolLimits::new(TOOL_LIMIT, Duration::from_secs(60))),
        ai_delay: Duration::ZERO,
    }
}

/// Serve the full router on a free local port for the current test runtime
pub async fn spawn_app() -> TestApp {
    let port = portpicker::pick_unused_port().expect("no free ports");
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("bind test listener");

    let app = mixerai_api::app(test_state());
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("test server");
    });

    TestApp {
        base_url: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
    }
}

pub fn token(role: GlobalRole) -> String {
    token_for(Uuid::new_v4(), role, 1)
}

pub fn token_for(user_id: Uuid, role: GlobalRole, hours: u64) -> String {
    let claims = Claims::new(user_id, Some(format!("{}@example.com", role.as_str())), role, hours);
    generate_jwt(&claims, SECRET).expect("sign test token")
}

/// A token whose expiry is already in the past
pub fn expired_token(role: GlobalRole) -> String {
    let mut claims = Claims::new(Uuid::new_v4(), None, role, 1);
    claims.exp = chrono::Utc::now().timestamp() - 3600;
    generate_jwt(&claims, SECRET).expect("sign test token")
}

pub async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.expect("JSON response body")
}
