//! Connection parameters of the voice stream endpoint.
//!
//! The query string decides the session mode and key:
//!
//! | Parameters                | Mode        | Key                         |
//! |---------------------------|-------------|-----------------------------|
//! | `callId` + `agentId`      | telephony   | `callId`                    |
//! | `campaignId` + `contactId`| telephony   | `{campaignId}-{contactId}`  |
//! | `voiceId` without `callId`| direct chat | `chat-{uuid}`               |
//!
//! Anything else is rejected before a session is created.

use serde::Deserialize;
use uuid::Uuid;

use crate::core::session::{SessionError, SessionIdentity, SessionKey, SessionMode, SessionResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStreamParams {
    pub call_id: Option<String>,
    pub agent_id: Option<String>,
    pub campaign_id: Option<String>,
    pub contact_id: Option<String>,
    pub voice_id: Option<String>,
    /// Persona text supplied by the client
    pub identity: Option<String>,
}

/// How a new connection maps onto a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub key: SessionKey,
    pub mode: SessionMode,
    /// Agent to look up in the directory
    pub agent_id: Option<String>,
    /// Voice requested by the client; wins over the directory
    pub voice: Option<String>,
    /// Persona requested by the client; wins over the directory
    pub persona: Option<String>,
}

impl SessionPlan {
    /// Whether identity must come from an asynchronous directory lookup.
    pub fn needs_lookup(&self) -> bool {
        self.agent_id.is_some()
    }

    /// Apply the client's voice and persona over a resolved identity.
    pub fn apply_overrides(&self, identity: SessionIdentity) -> SessionIdentity {
        if self.voice.is_none() && self.persona.is_none() {
            return identity;
        }
        SessionIdentity::new(
            self.persona.clone().unwrap_or(identity.persona),
            self.voice.clone().unwrap_or(identity.voice_name),
            identity.display_name,
        )
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl VoiceStreamParams {
    pub fn plan(&self) -> SessionResult<SessionPlan> {
        let call_id = present(&self.call_id);
        let agent_id = present(&self.agent_id);
        let voice = present(&self.voice_id);
        let persona = present(&self.identity);

        if let (Some(call_id), Some(agent_id)) = (&call_id, &agent_id) {
            return Ok(SessionPlan {
                key: SessionKey::new(call_id.as_str()),
                mode: SessionMode::Telephony,
                agent_id: Some(agent_id.clone()),
                voice,
                persona,
            });
        }

        if let (Some(campaign_id), Some(contact_id)) =
            (present(&self.campaign_id), present(&self.contact_id))
        {
            return Ok(SessionPlan {
                key: SessionKey::new(format!("{campaign_id}-{contact_id}")),
                mode: SessionMode::Telephony,
                agent_id,
                voice,
                persona,
            });
        }

        if voice.is_some() && call_id.is_none() {
            return Ok(SessionPlan {
                key: SessionKey::new(format!("chat-{}", Uuid::new_v4())),
                mode: SessionMode::DirectChat,
                agent_id: None,
                voice,
                persona,
            });
        }

        Err(SessionError::MissingIdentifiers(
            "expected callId and agentId, campaignId and contactId, or voiceId".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode a query string the way the `Query` extractor would.
    fn params(query: &str) -> VoiceStreamParams {
        let pairs: serde_json::Map<String, serde_json::Value> =
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
                .collect();
        serde_json::from_value(serde_json::Value::Object(pairs)).expect("Should parse params")
    }

    #[test]
    fn test_telephony_call() {
        let plan = params("callId=CA42&agentId=agent-1").plan().expect("Should plan");
        assert_eq!(plan.key, SessionKey::new("CA42"));
        assert_eq!(plan.mode, SessionMode::Telephony);
        assert_eq!(plan.agent_id.as_deref(), Some("agent-1"));
        assert!(plan.needs_lookup());
    }

    #[test]
    fn test_campaign_contact() {
        let plan = params("campaignId=c7&contactId=p9").plan().expect("Should plan");
        assert_eq!(plan.key.as_str(), "c7-p9");
        assert_eq!(plan.mode, SessionMode::Telephony);
        assert!(!plan.needs_lookup());
    }

    #[test]
    fn test_direct_chat_with_identity() {
        let plan = params("voiceId=eleven-bella&identity=You%20are%20a%20pirate.")
            .plan()
            .expect("Should plan");
        assert_eq!(plan.mode, SessionMode::DirectChat);
        assert!(plan.key.as_str().starts_with("chat-"));
        assert_eq!(plan.voice.as_deref(), Some("eleven-bella"));
        assert_eq!(plan.persona.as_deref(), Some("You are a pirate."));
        assert!(!plan.needs_lookup());
    }

    #[test]
    fn test_direct_chat_keys_are_unique() {
        let a = params("voiceId=eleven-bella").plan().expect("Should plan");
        let b = params("voiceId=eleven-bella").plan().expect("Should plan");
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_client_overrides_win() {
        let plan = params("callId=CA1&agentId=a1&voiceId=eleven-adam")
            .plan()
            .expect("Should plan");
        let resolved = SessionIdentity::new("Directory persona", "eleven-josh", "Dr. Smile");

        let identity = plan.apply_overrides(resolved.clone());
        assert_eq!(identity.persona, "Directory persona");
        assert_eq!(identity.voice_name, "eleven-adam");
        assert_eq!(identity.voice_id, "pFZP5JQG7iQjIQuC4Hyc");
        assert_eq!(identity.display_name, "Dr. Smile");

        let plain = params("callId=CA1&agentId=a1").plan().expect("Should plan");
        assert_eq!(plain.apply_overrides(resolved.clone()), resolved);
    }

    #[test]
    fn test_missing_identifiers() {
        for query in ["", "callId=CA1", "agentId=a1", "callId=CA1&voiceId=v", "callId=&agentId=a1"] {
            let result = params(query).plan();
            assert!(
                matches!(result, Err(SessionError::MissingIdentifiers(_))),
                "query {query:?} should be rejected"
            );
        }
    }
}
