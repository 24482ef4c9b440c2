//! LLM Provider implementations for Genesis.
//!
//! All providers implement the `genesis_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;
pub mod stub;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
pub use stub::StubProvider;
