//! Handler Module Index
//!
//! One module per resource. Every handler resolves its inputs through extractors,
//! runs a short pipeline of repository calls and aborts on the first `ApiError`.

/// List, create, fetch and delete posts.
pub mod posts;

/// Comments on a post.
pub mod comments;

/// Like, unlike and report.
pub mod reactions;
