mod common;

use serde_json::json;
use uuid::Uuid;

use common::{json_body, spawn_app, token};
use mixerai_api::database::models::GlobalRole;

#[tokio::test]
async fn viewers_cannot_read_templates() {
    let app = spawn_app().await;

    let response = app.get("/api/content-templates", &token(GlobalRole::Viewer)).await;
    assert_eq!(response.status(), 403);

    let body = json_body(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["error"], "Forbidden: You do not have permission to access this resource.");
}

#[tokio::test]
async fn template_writes_are_admin_only() {
    let app = spawn_app().await;
    let editor = token(GlobalRole::Editor);
    let path = format!("/api/content-templates/{}", Uuid::new_v4());
    let body = json!({ "name": "Blog", "inputFields": [], "outputFields": [] });

    assert_eq!(app.post_json("/api/content-templates", &editor, &body).await.status(), 403);
    assert_eq!(app.put_json(&path, &editor, &body).await.status(), 403);
    assert_eq!(app.delete(&path, &editor).await.status(), 403);
}

#[tokio::test]
async fn brand_create_and_delete_are_admin_only() {
    let app = spawn_app().await;
    let editor = token(GlobalRole::Editor);

    let created = app.post_json("/api/brands", &editor, &json!({ "name": "Oat Co" })).await;
    assert_eq!(created.status(), 403);

    let deleted = app.delete(&format!("/api/brands/{}", Uuid::new_v4()), &editor).await;
    assert_eq!(deleted.status(), 403);
}

#[tokio::test]
async fn ingredient_claims_are_admin_only() {
    let app = spawn_app().await;

    let body = json!({
        "claim_text": "Source of fibre",
        "claim_type": "allowed",
        "level": "ingredient",
        "ingredient_id": Uuid::new_v4(),
        "country_code": "GB",
    });
    let response = app.post_json("/api/claims", &token(GlobalRole::Editor), &body).await;
    assert_eq!(response.status(), 403);
    assert_eq!(
        json_body(response).await["error"],
        "You do not have permission to create this claim."
    );
}

#[tokio::test]
async fn viewers_cannot_use_tools() {
    let app = spawn_app().await;
    let viewer = token(GlobalRole::Viewer);

    for path in ["/api/tools/alt-text-generator", "/api/tools/metadata-generator"] {
        let response = app.post_json(path, &viewer, &json!({ "imageUrls": [], "urls": [] })).await;
        assert_eq!(response.status(), 403);
        assert_eq!(
            json_body(response).await["error"],
            "Forbidden: You do not have permission to access this tool."
        );
    }
}
