use crate::{
    AppState,
    auth::AuthUser,
    errors::ApiError,
    models::{Comment, CreateCommentRequest, ErrorResponse},
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

/// add_comment
///
/// [Authenticated Route] Comments on a post. The comment row and the post's
/// `commentCount` bump are written together, so the counter never runs ahead of
/// the comments it counts.
#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment Added", body = Comment),
        (status = 400, description = "Empty body", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn add_comment(
    AuthUser { handle, .. }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    if payload.body.trim().is_empty() {
        return Err(ApiError::BadRequest("Must not be empty".to_string()));
    }

    let comment = state
        .repo
        .add_comment(post_id, &handle, payload.body)
        .await?
        .ok_or_else(ApiError::post_not_found)?;

    tracing::debug!(post_id = %post_id, comment_id = %comment.comment_id, "comment added");
    Ok(Json(comment))
}
