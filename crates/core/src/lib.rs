//! # Genesis Core
//!
//! Domain types, traits, and error definitions for the Genesis persona forum
//! simulator. This crate has **no framework dependencies**: it defines the
//! domain model that the storage, provider and engine crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the text generation backend
//! - [`ThreadStore`]: durable posts, comments and read-state
//!
//! Implementations live in their respective crates, so the decision engine can
//! be driven by scripted providers and in-memory stores in tests.

pub mod error;
pub mod event;
pub mod message;
pub mod persona;
pub mod provider;
pub mod thread;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, PersonaError, Result, StoreError, TopicError};
pub use event::{ChoiceMode, EventBus, SimEvent};
pub use message::{Message, Role};
pub use persona::{Demographics, Persona};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use thread::{
    Comment, CommentForest, CommentId, CommentNode, NewComment, NewPost, Notification, Post,
    PostId, ThreadStore,
};
