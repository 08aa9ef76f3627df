//! HTTP adapters - axum routers, handlers, and DTOs.

pub mod auth;
pub mod conversation;
pub mod middleware;
pub mod recommendation;
pub mod task_definition;

use ::axum::routing::get;
use ::axum::{Json, Router};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use self::auth::AuthAppState;
use self::conversation::ConversationAppState;
use self::middleware::{auth_middleware, JwtAuth};
use self::recommendation::RecommendationAppState;
use self::task_definition::TaskDefinitionAppState;

/// Everything the HTTP layer needs to serve requests.
pub struct ApiContext {
    pub auth: AuthAppState,
    pub conversations: ConversationAppState,
    pub task_definitions: TaskDefinitionAppState,
    pub recommendations: RecommendationAppState,
    pub jwt: Arc<JwtAuth>,
}

/// Assembles the full application router.
///
/// All API routes live under `/api/v1` behind the auth middleware;
/// liveness endpoints stay public.
pub fn api_router(context: ApiContext, server: &ServerConfig) -> Router {
    let api = Router::new()
        .nest("/auth", auth::routes(context.auth))
        .nest("/conversations", conversation::routes(context.conversations))
        .nest(
            "/task-definitions",
            task_definition::routes(context.task_definitions),
        )
        .nest(
            "/recommendations",
            recommendation::routes(context.recommendations),
        )
        .layer(::axum::middleware::from_fn_with_state(
            context.jwt,
            auth_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(server)),
        )
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins = server.cors_origins_list();
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(parsed))
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Taskforge API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
