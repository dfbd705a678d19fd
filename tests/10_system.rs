mod common;

use common::{json_body, spawn_app};

#[tokio::test]
async fn root_describes_the_service() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/")).send().await.expect("request failed");
    assert_eq!(response.status(), 200);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "MixerAI API");
    assert!(body["data"]["endpoints"]["brands"].is_string());
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/health")).send().await.expect("request failed");
    assert_eq!(response.status(), 503);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "database unavailable");
    assert_eq!(body["data"]["status"], "degraded");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/nope")).send().await.expect("request failed");
    assert_eq!(response.status(), 404);
}
