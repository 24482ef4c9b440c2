//! Generation gateway: persona + instruction in, text out.
//!
//! Wraps whichever [`Provider`] the router produced. The gateway is built once
//! at startup and handed to the policy, scheduler and debate session.

use genesis_core::error::GenerationError;
use genesis_core::message::Message;
use genesis_core::persona::Persona;
use genesis_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::system_identity;

/// Every placeholder written in place of a failed generation starts with this.
pub const ERROR_MARKER: &str = "[Error:";

pub struct GenerationGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl GenerationGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.9,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Build from the loaded configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &genesis_config::AppConfig) -> Self {
        Self::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text in `persona`'s voice.
    pub async fn generate(
        &self,
        persona: &Persona,
        instruction: &str,
        include_backstory: bool,
    ) -> Result<String, GenerationError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(system_identity(persona, include_backstory)),
                Message::user(instruction),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            persona = %persona.name,
            provider = %self.provider.name(),
            backstory = include_backstory,
            "Requesting generation"
        );

        let response = self.provider.complete(request).await?;
        let text = response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse(self.provider.name().to_string()));
        }
        Ok(text)
    }

    /// Like [`generate`](Self::generate), but a failure becomes a visible
    /// placeholder instead of an error. The error is handed back alongside so
    /// the caller can report it.
    pub async fn generate_or_placeholder(
        &self,
        persona: &Persona,
        instruction: &str,
        include_backstory: bool,
    ) -> (String, Option<GenerationError>) {
        match self.generate(persona, instruction, include_backstory).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(persona = %persona.name, "Generation failed, using placeholder: {e}");
                (placeholder(&e), Some(e))
            }
        }
    }
}

/// The text committed in place of a failed generation.
pub fn placeholder(error: &GenerationError) -> String {
    format!("{ERROR_MARKER} {error}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, ScriptedProvider, persona};

    #[tokio::test]
    async fn generate_sends_identity_and_trims() {
        let provider = Arc::new(ScriptedProvider::new(vec!["  Hello there.  \n"]));
        let gateway = GenerationGateway::new(provider.clone(), "test-model");
        let p = persona("nyx", None, &[]);

        let text = gateway.generate(&p, "Say hi", false).await.unwrap();
        assert_eq!(text, "Hello there.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].messages[0].content.contains("Name: nyx"));
        assert!(!requests[0].messages[0].content.contains("SECRET KNOWLEDGE"));
        assert_eq!(requests[0].messages[1].content, "Say hi");
        assert_eq!(requests[0].model, "test-model");
    }

    #[tokio::test]
    async fn backstory_flag_reaches_system_prompt() {
        let provider = Arc::new(ScriptedProvider::new(vec!["ok"]));
        let gateway = GenerationGateway::new(provider.clone(), "m");
        gateway
            .generate(&persona("nyx", None, &[]), "Tell a story", true)
            .await
            .unwrap();
        assert!(provider.requests()[0].messages[0].content.contains("SECRET KNOWLEDGE"));
    }

    #[tokio::test]
    async fn blank_response_is_an_error() {
        let gateway = GenerationGateway::new(Arc::new(ScriptedProvider::new(vec!["   "])), "m");
        let err = gateway
            .generate(&persona("nyx", None, &[]), "x", false)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn failure_becomes_marked_placeholder() {
        let gateway = GenerationGateway::new(Arc::new(FailingProvider), "m");
        let (text, err) = gateway
            .generate_or_placeholder(&persona("nyx", None, &[]), "x", false)
            .await;
        assert!(text.starts_with(ERROR_MARKER));
        assert!(text.ends_with(']'));
        assert!(err.is_some());
    }
}
