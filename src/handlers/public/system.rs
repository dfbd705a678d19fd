use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "MixerAI API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Brands, products, claims, content templates and AI copywriting tools",
            "endpoints": {
                "health": "/health (public)",
                "brands": "/api/brands[/:id] (protected)",
                "claims": "/api/claims[/:id] (protected)",
                "products": "/api/products[/:id] (protected)",
                "content_templates": "/api/content-templates[/:id] (protected)",
                "tools": "/api/tools/alt-text-generator, /api/tools/metadata-generator (protected)",
                "ai": "/api/content/generate/article-titles, /api/ai/generate-* (protected)",
            }
        }
    }))
}

/// GET /health - Database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
