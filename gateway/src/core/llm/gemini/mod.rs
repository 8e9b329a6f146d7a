//! Google Gemini response generation.

mod client;
mod messages;

pub use client::{DEFAULT_GEMINI_MODEL, GEMINI_API_URL, GeminiClient, GeminiConfig};
pub use messages::{Content, GenerateContentRequest, GenerateContentResponse, Part};
