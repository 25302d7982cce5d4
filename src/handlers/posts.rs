use crate::{
    AppState,
    auth::AuthUser,
    errors::ApiError,
    models::{
        CreatePostRequest, ErrorResponse, MessageResponse, NewPost, Post, PostFilter,
        PostWithComments,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

/// get_posts
///
/// [Public Route] Lists posts, newest first, optionally narrowed by author handle or tag.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostFilter),
    responses(
        (status = 200, description = "Posts, newest first", body = [Post]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.repo.list_posts(filter).await?;
    Ok(Json(posts))
}

/// create_post
///
/// [Authenticated Route] Publishes a new post. Author handle and image are taken from
/// the caller identity; all counters start at zero.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Created", body = Post),
        (status = 401, description = "No identity", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn create_post(
    author: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let new_post = NewPost::new(&author.as_user(), payload);
    let post = state.repo.create_post(new_post).await?;

    tracing::info!(post_id = %post.post_id, handle = %post.handle_name, "post created");
    Ok(Json(post))
}

/// get_post
///
/// [Public Route] Fetches one post together with its comments, newest first.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostWithComments),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostWithComments>, ApiError> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(ApiError::post_not_found)?;

    let comments = state.repo.get_comments(post.post_id).await?;

    Ok(Json(PostWithComments { post, comments }))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post. Only the author may do so; comments and
/// reactions on the post are removed with it.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_post(
    AuthUser { handle, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let post = state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(ApiError::post_not_found)?;

    if post.handle_name != handle {
        return Err(ApiError::Forbidden(
            "Unauthorized to delete post".to_string(),
        ));
    }

    // Someone else may have removed it between the read and here.
    if !state.repo.delete_post(id).await? {
        return Err(ApiError::post_not_found());
    }

    tracing::info!(post_id = %id, handle = %handle, "post deleted");
    Ok(Json(MessageResponse {
        message: "Deleted successfully".to_string(),
    }))
}
