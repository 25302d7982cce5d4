use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The identity record consumed by the `AuthUser` extractor. The handle is the
/// user's unique public name and is what posts, comments and reactions reference.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub handle: String,
    pub image_url: Option<String>,
}

/// Post
///
/// A row of the `posts` table. The three counters are denormalized: they are only
/// ever changed in the same transaction that creates or removes the related
/// comment or reaction row.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Post {
    /// Assigned by the store on creation.
    #[sqlx(rename = "id")]
    pub post_id: Uuid,
    // Handle of the owner; the only identity allowed to delete the post.
    pub handle_name: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub user_image: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "number")]
    pub like_count: i64,
    #[ts(type = "number")]
    pub comment_count: i64,
    #[ts(type = "number")]
    pub report_count: i64,
}

/// NewPost
///
/// A post as built by the create handler, before the store has assigned an id.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub handle_name: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub user_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new(author: &User, req: CreatePostRequest) -> Self {
        Self {
            handle_name: author.handle.clone(),
            title: req.title,
            body: req.body,
            tags: req.tags,
            user_image: author.image_url.clone(),
            created_at: Utc::now(),
        }
    }

    /// Materializes the stored post. Counters always start at zero.
    pub fn into_post(self, post_id: Uuid) -> Post {
        Post {
            post_id,
            handle_name: self.handle_name,
            title: self.title,
            body: self.body,
            tags: self.tags,
            user_image: self.user_image,
            created_at: self.created_at,
            like_count: 0,
            comment_count: 0,
            report_count: 0,
        }
    }
}

/// Comment
///
/// A row of the `comments` table. Comments are never edited or deleted directly;
/// they go away with their post.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Comment {
    #[sqlx(rename = "id")]
    pub comment_id: Uuid,
    pub body: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub post_id: Uuid,
    pub user_handle: String,
}

/// ReactionKind
///
/// The two kinds of per-user reaction a post can receive. Each kind has its own
/// table keyed by `(post_id, user_handle)` and its own counter on the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Like,
    Report,
}

impl ReactionKind {
    pub fn table(self) -> &'static str {
        match self {
            ReactionKind::Like => "likes",
            ReactionKind::Report => "report",
        }
    }

    pub fn counter_column(self) -> &'static str {
        match self {
            ReactionKind::Like => "like_count",
            ReactionKind::Report => "report_count",
        }
    }
}

/// Reaction
///
/// One user's reaction of one kind to one post.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reaction {
    pub kind: ReactionKind,
    pub post_id: Uuid,
    pub user_handle: String,
}

impl Reaction {
    pub fn new(kind: ReactionKind, post_id: Uuid, user_handle: impl Into<String>) -> Self {
        Self {
            kind,
            post_id,
            user_handle: user_handle.into(),
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreatePostRequest
///
/// Input payload for POST /posts. Author handle and image come from the caller identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub body: String,
}

/// PostFilter
///
/// Optional query parameters for GET /posts. With no parameters every post is listed.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostFilter {
    /// Only posts authored by this handle.
    pub handle: Option<String>,
    /// Only posts carrying this tag.
    pub tag: Option<String>,
}

// --- Response Schemas (Output) ---

/// PostWithComments
///
/// Response of GET /posts/{id}: the post fields at the top level plus its comments,
/// newest first.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

/// ErrorResponse
///
/// The single error envelope returned by every failing handler.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
