use crate::models::{Comment, NewPost, Post, PostFilter, Reaction, ReactionKind, User};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Column list shared by every query that materializes a `Post`.
const POST_COLUMNS: &str = "id, handle_name, title, body, tags, user_image, created_at, \
                            like_count, comment_count, report_count";

const COMMENT_COLUMNS: &str = "id, body, created_at, post_id, user_handle";

/// RepositoryError
///
/// Failure of the underlying store. Handlers never inspect it beyond turning it
/// into a 500.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// ReactionOutcome
///
/// Result of an atomic add/remove of a reaction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionOutcome {
    /// The reaction row was written (or removed) and the counter adjusted; carries the
    /// post as it is after the change.
    Applied(Post),
    /// Nothing to do: the reaction already existed (add) or did not exist (remove).
    Unchanged,
    /// No post with that id.
    PostMissing,
}

/// Repository Trait
///
/// The contract between the handlers and the document store. Every operation that
/// touches a denormalized counter does so atomically with the row it counts, so
/// handlers never need a read-check-write sequence of their own.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Posts ---
    // Newest first, ties broken by id (descending).
    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, RepositoryError>;
    async fn create_post(&self, new_post: NewPost) -> Result<Post, RepositoryError>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, RepositoryError>;
    // Returns false if the post did not exist. Removes its comments and reactions too.
    async fn delete_post(&self, id: Uuid) -> Result<bool, RepositoryError>;

    // --- Comments ---
    async fn get_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepositoryError>;
    /// Inserts the comment and bumps `comment_count` together. `None` if the post is missing.
    async fn add_comment(
        &self,
        post_id: Uuid,
        user_handle: &str,
        body: String,
    ) -> Result<Option<Comment>, RepositoryError>;

    // --- Reactions ---
    async fn add_reaction(&self, reaction: Reaction) -> Result<ReactionOutcome, RepositoryError>;
    async fn remove_reaction(&self, reaction: Reaction)
    -> Result<ReactionOutcome, RepositoryError>;

    // --- Identity ---
    async fn get_user(&self, handle: &str) -> Result<Option<User>, RepositoryError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Reaction uniqueness rests on the composite
/// primary keys of `likes` and `report`; counters move inside the same transaction.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_posts
    ///
    /// Builds the filter with QueryBuilder so every user-supplied value is bound.
    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE TRUE"));

        if let Some(handle) = filter.handle {
            builder.push(" AND handle_name = ");
            builder.push_bind(handle);
        }

        if let Some(tag) = filter.tag {
            builder.push(" AND ");
            builder.push_bind(tag);
            builder.push(" = ANY(tags)");
        }

        builder.push(" ORDER BY created_at DESC, id DESC");

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("list_posts error: {:?}", e))?;

        Ok(posts)
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post, RepositoryError> {
        let sql = format!(
            "INSERT INTO posts (id, handle_name, title, body, tags, user_image, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {POST_COLUMNS}"
        );

        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_post.handle_name)
            .bind(&new_post.title)
            .bind(&new_post.body)
            .bind(&new_post.tags)
            .bind(&new_post.user_image)
            .bind(new_post.created_at)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("create_post error: {:?}", e))?;

        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");

        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// delete_post
    ///
    /// Comments, likes and reports go with the post through `ON DELETE CASCADE`.
    async fn delete_post(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("delete_post error: {:?}", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepositoryError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );

        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    /// add_comment
    ///
    /// Counter bump first: the `UPDATE ... RETURNING` doubles as the existence check
    /// and holds the post row lock until commit.
    async fn add_comment(
        &self,
        post_id: Uuid,
        user_handle: &str,
        body: String,
    ) -> Result<Option<Comment>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query_scalar::<_, Uuid>(
            "UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1 RETURNING id",
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        if bumped.is_none() {
            // Dropping the transaction rolls it back.
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO comments (id, post_id, user_handle, body, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        );

        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(post_id)
            .bind(user_handle)
            .bind(&body)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!("add_comment error: {:?}", e))?;

        tx.commit().await?;

        Ok(Some(comment))
    }

    /// add_reaction
    ///
    /// `ON CONFLICT DO NOTHING` on the composite key decides whether this is the
    /// first reaction; the counter only moves when a row was actually inserted.
    async fn add_reaction(&self, reaction: Reaction) -> Result<ReactionOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !lock_post(&mut tx, reaction.post_id).await? {
            return Ok(ReactionOutcome::PostMissing);
        }

        let insert = format!(
            "INSERT INTO {} (post_id, user_handle) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            reaction.kind.table()
        );

        let inserted = sqlx::query(&insert)
            .bind(reaction.post_id)
            .bind(&reaction.user_handle)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !inserted {
            return Ok(ReactionOutcome::Unchanged);
        }

        let post = adjust_counter(&mut tx, reaction.kind, reaction.post_id, 1).await?;
        tx.commit().await?;

        Ok(ReactionOutcome::Applied(post))
    }

    async fn remove_reaction(
        &self,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if !lock_post(&mut tx, reaction.post_id).await? {
            return Ok(ReactionOutcome::PostMissing);
        }

        let delete = format!(
            "DELETE FROM {} WHERE post_id = $1 AND user_handle = $2",
            reaction.kind.table()
        );

        let deleted = sqlx::query(&delete)
            .bind(reaction.post_id)
            .bind(&reaction.user_handle)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !deleted {
            return Ok(ReactionOutcome::Unchanged);
        }

        let post = adjust_counter(&mut tx, reaction.kind, reaction.post_id, -1).await?;
        tx.commit().await?;

        Ok(ReactionOutcome::Applied(post))
    }

    async fn get_user(&self, handle: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>("SELECT handle, image_url FROM users WHERE handle = $1")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

/// Takes the row lock on a post for the rest of the transaction. False if it does not exist.
async fn lock_post(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    post_id: Uuid,
) -> Result<bool, RepositoryError> {
    let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(found.is_some())
}

async fn adjust_counter(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    kind: ReactionKind,
    post_id: Uuid,
    delta: i64,
) -> Result<Post, RepositoryError> {
    let column = kind.counter_column();
    let sql = format!(
        "UPDATE posts SET {column} = {column} + $2 WHERE id = $1 RETURNING {POST_COLUMNS}"
    );

    let post = sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .bind(delta)
        .fetch_one(&mut **tx)
        .await?;

    Ok(post)
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryStore {
    users: HashMap<String, User>,
    posts: HashMap<Uuid, Post>,
    comments: Vec<Comment>,
    reactions: HashSet<Reaction>,
}

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the test suites and as the
/// local fallback when no `DATABASE_URL` is configured. Every operation runs under a
/// single write lock, which gives the same atomicity as the Postgres transactions.
pub struct MemoryRepository {
    store: RwLock<MemoryStore>,
    /// When true, all operations return a simulated store failure.
    pub should_fail: bool,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(MemoryStore::default()),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// Seeds an identity record, replacing any existing user with the same handle.
    pub fn with_user(mut self, handle: &str, image_url: Option<&str>) -> Self {
        let user = User {
            handle: handle.to_string(),
            image_url: image_url.map(str::to_string),
        };
        self.store.get_mut().users.insert(user.handle.clone(), user);
        self
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.should_fail {
            return Err(RepositoryError::Unavailable(
                "simulated store failure".to_string(),
            ));
        }
        Ok(())
    }
}

fn counter_mut(post: &mut Post, kind: ReactionKind) -> &mut i64 {
    match kind {
        ReactionKind::Like => &mut post.like_count,
        ReactionKind::Report => &mut post.report_count,
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, RepositoryError> {
        self.check()?;
        let store = self.store.read().await;

        let mut posts: Vec<Post> = store
            .posts
            .values()
            .filter(|p| filter.handle.as_ref().is_none_or(|h| &p.handle_name == h))
            .filter(|p| filter.tag.as_ref().is_none_or(|t| p.tags.contains(t)))
            .cloned()
            .collect();

        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.post_id.cmp(&a.post_id))
        });

        Ok(posts)
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post, RepositoryError> {
        self.check()?;
        let post = new_post.into_post(Uuid::new_v4());
        self.store
            .write()
            .await
            .posts
            .insert(post.post_id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        self.check()?;
        Ok(self.store.read().await.posts.get(&id).cloned())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.check()?;
        let mut store = self.store.write().await;

        if store.posts.remove(&id).is_none() {
            return Ok(false);
        }

        store.comments.retain(|c| c.post_id != id);
        store.reactions.retain(|r| r.post_id != id);

        Ok(true)
    }

    async fn get_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepositoryError> {
        self.check()?;
        let store = self.store.read().await;

        let mut comments: Vec<Comment> = store
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();

        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.comment_id.cmp(&a.comment_id))
        });

        Ok(comments)
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        user_handle: &str,
        body: String,
    ) -> Result<Option<Comment>, RepositoryError> {
        self.check()?;
        let mut store = self.store.write().await;

        let Some(post) = store.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        post.comment_count += 1;

        let comment = Comment {
            comment_id: Uuid::new_v4(),
            body,
            created_at: Utc::now(),
            post_id,
            user_handle: user_handle.to_string(),
        };
        store.comments.push(comment.clone());

        Ok(Some(comment))
    }

    async fn add_reaction(&self, reaction: Reaction) -> Result<ReactionOutcome, RepositoryError> {
        self.check()?;
        let mut store = self.store.write().await;
        let store = &mut *store;

        let Some(post) = store.posts.get_mut(&reaction.post_id) else {
            return Ok(ReactionOutcome::PostMissing);
        };

        let kind = reaction.kind;
        if !store.reactions.insert(reaction) {
            return Ok(ReactionOutcome::Unchanged);
        }

        *counter_mut(post, kind) += 1;
        Ok(ReactionOutcome::Applied(post.clone()))
    }

    async fn remove_reaction(
        &self,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, RepositoryError> {
        self.check()?;
        let mut store = self.store.write().await;
        let store = &mut *store;

        let Some(post) = store.posts.get_mut(&reaction.post_id) else {
            return Ok(ReactionOutcome::PostMissing);
        };

        if !store.reactions.remove(&reaction) {
            return Ok(ReactionOutcome::Unchanged);
        }

        *counter_mut(post, reaction.kind) -= 1;
        Ok(ReactionOutcome::Applied(post.clone()))
    }

    async fn get_user(&self, handle: &str) -> Result<Option<User>, RepositoryError> {
        self.check()?;
        Ok(self.store.read().await.users.get(handle).cloned())
    }
}
