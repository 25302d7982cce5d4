//! Router Module Index
//!
//! Routes are split by access level so the authentication layer is applied to a
//! whole module at once rather than handler by handler.

/// Routes accessible to all callers (anonymous, read-only).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
pub mod authenticated;
