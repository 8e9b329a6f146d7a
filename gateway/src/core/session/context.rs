//! Append-only conversation history for one session.

use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One utterance in the conversation. Fields are read-only once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

#[derive(Debug, Default)]
pub struct ConversationContext {
    turns: RwLock<Vec<Turn>>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn stamped with the current UTC time.
    pub fn append(&self, role: Role, text: impl Into<String>) -> Turn {
        let turn = Turn::new(role, text);
        self.turns.write().push(turn.clone());
        turn
    }

    /// Copy of the history in append order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.read().clone()
    }

    pub fn last(&self) -> Option<Turn> {
        self.turns.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let context = ConversationContext::new();
        context.append(Role::User, "hello");
        context.append(Role::Agent, "hi there");

        let turns = context.snapshot();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role(), Role::User);
        assert_eq!(turns[0].text(), "hello");
        assert_eq!(turns[1].role(), Role::Agent);
        assert!(turns[0].timestamp() <= turns[1].timestamp());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let context = ConversationContext::new();
        context.append(Role::User, "one");
        let snapshot = context.snapshot();
        context.append(Role::User, "two");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(context.len(), 2);
        assert_eq!(context.last().map(|t| t.text().to_string()).as_deref(), Some("two"));
    }

    #[test]
    fn test_turn_serializes_role_lowercase() {
        let turn = Turn::new(Role::Agent, "ok");
        let json = serde_json::to_value(&turn).expect("Should serialize");
        assert_eq!(json["role"], "agent");
        assert_eq!(json["text"], "ok");
        assert!(json["timestamp"].is_string());
    }
}
