//! Error types for the Genesis domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Genesis operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generation errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Storage errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Persona errors ---
    #[error("Persona error: {0}")]
    Persona(#[from] PersonaError),

    // --- Topic errors ---
    #[error("Topic error: {0}")]
    Topic(#[from] TopicError),

    // --- Roster errors ---
    #[error("Need at least {needed} distinct participants, got {got}")]
    NotEnoughParticipants { needed: usize, got: usize },

    #[error("Participant '{0}' is listed more than once")]
    DuplicateParticipant(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the text generation backend.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Post {0} does not exist")]
    PostNotFound(i64),

    #[error("Parent comment {parent} does not belong to post {post}")]
    InvalidParent { post: i64, parent: i64 },

    #[error("Comment {0} does not exist")]
    CommentNotFound(i64),
}

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Persona not found: {0}")]
    NotFound(String),

    #[error("Failed to read persona file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse persona file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Persona '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum TopicError {
    #[error("Failed to read topics file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse topics file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Topics file {0} contains no topics")]
    Empty(PathBuf),
}
