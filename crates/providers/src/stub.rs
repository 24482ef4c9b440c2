//! Offline stub provider, used when no API key is configured.
//!
//! Lets the whole simulation run end-to-end without network access. Every
//! request gets the same short canned reply.

use async_trait::async_trait;
use genesis_core::error::GenerationError;
use genesis_core::message::Message;
use genesis_core::provider::{Provider, ProviderRequest, ProviderResponse};

pub const STUB_REPLY: &str = "This is a short, simulated test reply from the Director model.";

/// A provider that never leaves the process.
pub struct StubProvider {
    reply: String,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            reply: STUB_REPLY.into(),
        }
    }

    /// Use a different canned reply.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, GenerationError> {
        Ok(ProviderResponse {
            message: Message::assistant(&self.reply),
            usage: None,
            model: request.model,
        })
    }
}
