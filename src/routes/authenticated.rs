use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` layer, and each handler also
/// receives the resolved `AuthUser` for its own ownership and uniqueness rules.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /posts
        .route("/posts", post(handlers::posts::create_post))
        // DELETE /posts/{id}
        // Owner-only; anyone else gets 403.
        .route("/posts/{id}", delete(handlers::posts::delete_post))
        // POST /posts/{id}/comments
        .route("/posts/{id}/comments", post(handlers::comments::add_comment))
        // --- Reactions ---
        // One like and one report per (user, post).
        .route("/posts/{id}/like", post(handlers::reactions::like_post))
        .route("/posts/{id}/unlike", post(handlers::reactions::unlike_post))
        .route("/posts/{id}/report", post(handlers::reactions::report_post))
}
