//! Agent directory: where telephony sessions find their persona and voice.
//!
//! Agent management lives outside this service. The gateway only needs a
//! read-only lookup by agent id; the shipped implementation serves a static
//! table loaded from the `agents:` section of the YAML configuration.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::session::SessionIdentity;

/// Agent attributes relevant to a voice session. Missing fields fall back to
/// the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    pub persona: Option<String>,
    pub voice_id: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    #[error("Directory lookup timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn lookup(&self, agent_id: &str) -> Result<Option<AgentProfile>, DirectoryError>;
}

/// In-memory directory built from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAgentDirectory {
    agents: HashMap<String, AgentProfile>,
}

impl StaticAgentDirectory {
    pub fn new(agents: HashMap<String, AgentProfile>) -> Self {
        Self { agents }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[async_trait]
impl AgentDirectory for StaticAgentDirectory {
    async fn lookup(&self, agent_id: &str) -> Result<Option<AgentProfile>, DirectoryError> {
        Ok(self.agents.get(agent_id).cloned())
    }
}

/// Fallback values for any identity attribute a profile leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDefaults {
    pub persona: String,
    pub voice: String,
    pub display_name: String,
}

impl IdentityDefaults {
    /// Merge `profile` over the defaults. Blank profile fields count as missing.
    pub fn apply(&self, profile: Option<&AgentProfile>) -> SessionIdentity {
        let pick = |value: Option<&String>, default: &str| -> String {
            value
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let profile = profile.cloned().unwrap_or_default();
        SessionIdentity::new(
            pick(profile.persona.as_ref(), &self.persona),
            pick(profile.voice_id.as_ref(), &self.voice),
            pick(profile.display_name.as_ref(), &self.display_name),
        )
    }
}

/// Look `agent_id` up with a deadline and merge the result over `defaults`.
///
/// Lookup errors, timeouts and unknown agents all yield the defaults so the
/// session can still activate.
pub async fn resolve_agent_identity(
    directory: &dyn AgentDirectory,
    agent_id: &str,
    defaults: &IdentityDefaults,
    deadline: Duration,
) -> SessionIdentity {
    let profile = match tokio::time::timeout(deadline, directory.lookup(agent_id)).await {
        Ok(Ok(Some(profile))) => {
            debug!(agent_id, "Agent profile found");
            Some(profile)
        }
        Ok(Ok(None)) => {
            warn!(agent_id, "Agent not found in directory, using defaults");
            None
        }
        Ok(Err(e)) => {
            warn!(agent_id, "Agent lookup failed, using defaults: {}", e);
            None
        }
        Err(_) => {
            warn!(
                agent_id,
                "Agent lookup failed, using defaults: {}",
                DirectoryError::Timeout(deadline)
            );
            None
        }
    };

    defaults.apply(profile.as_ref())
}
