//! Response generation: turns persona and conversation history into the
//! agent's next utterance.

mod base;
pub mod gemini;
mod prompt;

pub use base::{
    FALLBACK_RESPONSE, GenerationOutcome, LlmError, LlmResult, ResponseGenerator,
    generate_or_fallback,
};
pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::{PromptStyle, build_concatenated_prompt};
