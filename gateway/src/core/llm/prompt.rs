use std::str::FromStr;

use serde::Deserialize;

use crate::core::session::{Role, Turn};

/// How persona and history are presented to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// Persona as a system instruction, history as role-tagged turns
    #[default]
    Structured,
    /// Persona and history flattened into a single user message
    Concatenated,
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" => Ok(PromptStyle::Structured),
            "concatenated" | "flat" => Ok(PromptStyle::Concatenated),
            other => Err(format!(
                "Invalid prompt style '{other}', expected structured or concatenated"
            )),
        }
    }
}

/// Flatten persona and history into one prompt:
///
/// ```text
/// <persona>
///
/// User: hello
/// Assistant: hi there
/// User: what's open today?
/// ```
pub fn build_concatenated_prompt(persona: &str, context: &[Turn]) -> String {
    let history: Vec<String> = context
        .iter()
        .map(|turn| match turn.role() {
            Role::User => format!("User: {}", turn.text()),
            Role::Agent => format!("Assistant: {}", turn.text()),
        })
        .collect();

    format!("{}\n\n{}", persona, history.join("\n"))
}
