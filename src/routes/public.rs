use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only endpoints that need no identity.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /posts?handle=...&tag=...
        // Newest first.
        .route("/posts", get(handlers::posts::get_posts))
        // GET /posts/{id}
        // The post with its comments attached.
        .route("/posts/{id}", get(handlers::posts::get_post))
}
