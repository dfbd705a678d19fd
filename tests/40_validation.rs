mod common;

use serde_json::json;
use uuid::Uuid;

use common::{json_body, spawn_app, token};
use mixerai_api::database::models::GlobalRole;

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/claims"))
        .bearer_auth(token(GlobalRole::Admin))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_JSON");
    assert_eq!(body["error"], "Invalid JSON payload.");
}

#[tokio::test]
async fn path_ids_must_be_uuids() {
    let app = spawn_app().await;
    let admin = token(GlobalRole::Admin);

    for (path, message) in [
        ("/api/brands/42", "Invalid brand ID format."),
        ("/api/claims/abc", "Invalid claim ID format."),
        ("/api/products/xyz", "Invalid product ID format."),
        ("/api/content-templates/1", "Invalid template ID format."),
    ] {
        let response = app.get(path, &admin).await;
        assert_eq!(response.status(), 400, "{path}");
        assert_eq!(json_body(response).await["error"], message);
    }
}

#[tokio::test]
async fn claim_create_validates_fields() {
    let app = spawn_app().await;
    let editor = token(GlobalRole::Editor);

    let cases = [
        (json!({ "claim_type": "allowed" }), "Claim text must be a non-empty string."),
        (
            json!({ "claim_text": "High in protein", "claim_type": "maybe" }),
            "Invalid claim_type.",
        ),
        (
            json!({ "claim_text": "High in protein", "claim_type": "allowed", "level": "global" }),
            "Invalid level.",
        ),
        (
            json!({ "claim_text": "High in protein", "claim_type": "allowed", "level": "product", "country_code": "GB" }),
            "A valid product_id is required for product-level claims.",
        ),
    ];
    for (body, message) in cases {
        let response = app.post_json("/api/claims", &editor, &body).await;
        assert_eq!(response.status(), 400);
        assert_eq!(json_body(response).await["error"], message);
    }
}

#[tokio::test]
async fn claim_update_needs_an_updatable_field() {
    let app = spawn_app().await;

    let path = format!("/api/claims/{}", Uuid::new_v4());
    let response = app
        .put_json(&path, &token(GlobalRole::Editor), &json!({ "level": "brand" }))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "No updatable fields provided.");
}

#[tokio::test]
async fn claim_list_rejects_unknown_filters() {
    let app = spawn_app().await;

    let response = app.get("/api/claims?level=planet", &token(GlobalRole::Viewer)).await;
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "Invalid level.");
}

#[tokio::test]
async fn malformed_query_ids_use_error_envelope() {
    let app = spawn_app().await;
    let admin = token(GlobalRole::Admin);

    for path in [
        "/api/claims?master_brand_id=abc",
        "/api/products?master_brand_id=abc",
        "/api/content-templates?brand_id=abc",
    ] {
        let response = app.get(path, &admin).await;
        assert_eq!(response.status(), 400, "{path}");

        let body = json_body(response).await;
        assert_eq!(body["success"], false, "{path}");
        assert_eq!(body["code"], "BAD_REQUEST", "{path}");
        assert_eq!(body["error"], "Invalid query parameters.", "{path}");
    }
}

#[tokio::test]
async fn non_boolean_delete_cascade_is_not_a_query_error() {
    let app = spawn_app().await;

    let path = format!("/api/brands/{}?deleteCascade=1", Uuid::new_v4());
    let response = app.delete(&path, &token(GlobalRole::Editor)).await;
    assert_eq!(response.status(), 403);
    assert_eq!(json_body(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn product_create_requires_name_and_brand() {
    let app = spawn_app().await;
    let editor = token(GlobalRole::Editor);

    let response = app.post_json("/api/products", &editor, &json!({ "name": "  " })).await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        json_body(response).await["error"],
        "Product name is required and must be a non-empty string."
    );

    let response = app.post_json("/api/products", &editor, &json!({ "name": "Granola" })).await;
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "Master Brand ID is required.");
}

#[tokio::test]
async fn template_update_requires_fields() {
    let app = spawn_app().await;

    let path = format!("/api/content-templates/{}", Uuid::new_v4());
    let response = app
        .put_json(&path, &token(GlobalRole::Admin), &json!({ "name": "Blog" }))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        json_body(response).await["error"],
        "Name, inputFields, and outputFields are required"
    );
}

#[tokio::test]
async fn workflow_description_reports_field_errors() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/ai/generate-workflow-description", &token(GlobalRole::Editor), &json!({}))
        .await;
    assert_eq!(response.status(), 400);

    let body = json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(body["details"]["workflowName"]["_errors"][0], "Required");
}

#[tokio::test]
async fn article_titles_need_a_topic() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/content/generate/article-titles", &token(GlobalRole::Viewer), &json!({ "topic": "" }))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "Topic is required in the request body");
}

#[tokio::test]
async fn template_description_needs_a_name() {
    let app = spawn_app().await;

    let response = app
        .post_json("/api/ai/generate-template-description", &token(GlobalRole::Editor), &json!({}))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(json_body(response).await["error"], "Template name is required");
}
