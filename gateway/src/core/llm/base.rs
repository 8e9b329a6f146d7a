use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::core::session::Turn;

/// Text reported to the client when no reply could be generated.
pub const FALLBACK_RESPONSE: &str = "unable to generate a response";

/// Errors raised by response generation providers.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider returned no text")]
    EmptyResponse,
}

pub type LlmResult<T> = Result<T, LlmError>;

/// Produces the agent's next utterance from persona and history.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to the last user turn in `context`.
    async fn generate(&self, persona: &str, context: &[Turn]) -> LlmResult<String>;

    fn provider_info(&self) -> &'static str;
}

/// Result of a generation attempt after errors have been absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    /// The provider failed; `reason` is for logs only
    Fallback { reason: String },
}

impl GenerationOutcome {
    /// Text to show the client.
    pub fn text(&self) -> &str {
        match self {
            GenerationOutcome::Generated(text) => text,
            GenerationOutcome::Fallback { .. } => FALLBACK_RESPONSE,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationOutcome::Fallback { .. })
    }
}

/// Call `generator`, folding every failure and blank reply into
/// [`GenerationOutcome::Fallback`].
pub async fn generate_or_fallback(
    generator: &dyn ResponseGenerator,
    persona: &str,
    context: &[Turn],
) -> GenerationOutcome {
    match generator.generate(persona, context).await {
        Ok(text) if !text.trim().is_empty() => GenerationOutcome::Generated(text.trim().to_string()),
        Ok(_) => {
            warn!(provider = generator.provider_info(), "Generation returned blank text");
            GenerationOutcome::Fallback {
                reason: LlmError::EmptyResponse.to_string(),
            }
        }
        Err(e) => {
            warn!(provider = generator.provider_info(), "Generation failed: {}", e);
            GenerationOutcome::Fallback {
                reason: e.to_string(),
            }
        }
    }
}
