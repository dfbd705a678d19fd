pub mod ai;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Full router: public system routes plus the JWT-protected `/api` tree
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let api = Router::new()
        .merge(brand_routes())
        .merge(claim_routes())
        .merge(product_routes())
        .merge(template_routes())
        .merge(tool_routes())
        .merge(ai_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected
        .merge(api)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security.cors_origins))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
}

fn brand_routes() -> Router<AppState> {
    use protected::brands;

    Router::new()
        .route("/api/brands", get(brands::collection_get).post(brands::collection_post))
        .route(
            "/api/brands/:id",
            get(brands::record_get).put(brands::record_put).delete(brands::record_delete),
        )
}

fn claim_routes() -> Router<AppState> {
    use protected::claims;

    Router::new()
        .route("/api/claims", get(claims::collection_get).post(claims::collection_post))
        .route(
            "/api/claims/:id",
            get(claims::record_get).put(claims::record_put).delete(claims::record_delete),
        )
}

fn product_routes() -> Router<AppState> {
    use protected::products;

    Router::new()
        .route("/api/products", get(products::collection_get).post(products::collection_post))
        .route(
            "/api/products/:id",
            get(products::record_get).put(products::record_put).delete(products::record_delete),
        )
}

fn template_routes() -> Router<AppState> {
    use protected::templates;

    Router::new()
        .route(
            "/api/content-templates",
            get(templates::collection_get).post(templates::collection_post),
        )
        .route(
            "/api/content-templates/:id",
            get(templates::record_get).put(templates::record_put).delete(templates::record_delete),
        )
}

fn tool_routes() -> Router<AppState> {
    use protected::tools;

    Router::new()
        .route("/api/tools/alt-text-generator", post(tools::alt_text_post))
        .route("/api/tools/metadata-generator", post(tools::metadata_post))
}

fn ai_routes() -> Router<AppState> {
    use protected::ai;

    Router::new()
        .route("/api/content/generate/article-titles", post(ai::article_titles_post))
        .route("/api/ai/generate-workflow-description", post(ai::workflow_description_post))
        .route("/api/ai/generate-template-description", post(ai::template_description_post))
}
