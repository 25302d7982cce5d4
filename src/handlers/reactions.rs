use crate::{
    AppState,
    auth::AuthUser,
    errors::ApiError,
    models::{ErrorResponse, Post, Reaction, ReactionKind},
    repository::ReactionOutcome,
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

/// Maps the outcome of an atomic reaction write onto the response. `Unchanged` means
/// the caller already had (or never had) this reaction.
fn respond(outcome: ReactionOutcome, unchanged: &str) -> Result<Json<Post>, ApiError> {
    match outcome {
        ReactionOutcome::Applied(post) => Ok(Json(post)),
        ReactionOutcome::Unchanged => Err(ApiError::BadRequest(unchanged.to_string())),
        ReactionOutcome::PostMissing => Err(ApiError::post_not_found()),
    }
}

/// like_post
///
/// [Authenticated Route] Records the caller's like and bumps `likeCount`.
///
/// *Idempotency*: at most one like per (user, post), enforced by the store's
/// composite key; a repeat returns 400 and leaves the counter alone.
#[utoipa::path(
    post,
    path = "/posts/{id}/like",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Liked", body = Post),
        (status = 400, description = "Already liked", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn like_post(
    AuthUser { handle, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let like = Reaction::new(ReactionKind::Like, post_id, handle);
    let outcome = state.repo.add_reaction(like).await?;
    respond(outcome, "Post already liked")
}

/// unlike_post
///
/// [Authenticated Route] Removes the caller's like and decrements `likeCount`.
#[utoipa::path(
    post,
    path = "/posts/{id}/unlike",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Unliked", body = Post),
        (status = 400, description = "Not liked", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn unlike_post(
    AuthUser { handle, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let like = Reaction::new(ReactionKind::Like, post_id, handle);
    let outcome = state.repo.remove_reaction(like).await?;
    respond(outcome, "Post already unliked")
}

/// report_post
///
/// [Authenticated Route] Flags a post for moderation and bumps `reportCount`.
/// A user can report a given post once; there is no way to withdraw a report.
#[utoipa::path(
    post,
    path = "/posts/{id}/report",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Reported", body = Post),
        (status = 400, description = "Already reported", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn report_post(
    AuthUser { handle, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let report = Reaction::new(ReactionKind::Report, post_id, handle);
    let outcome = state.repo.add_reaction(report).await?;

    if let ReactionOutcome::Applied(post) = &outcome {
        tracing::info!(post_id = %post.post_id, reports = post.report_count, "post reported");
    }

    respond(outcome, "Post already reported")
}
