//! Persisted conversation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One conversation's serialized chat history.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// External conversation identifier.
    pub conversation_id: String,
    /// Serialized history blob; empty when nothing has been exchanged yet.
    pub messages: String,
    /// Last time the record was written.
    pub last_modified: DateTime<Utc>,
}

impl ConversationRecord {
    /// Default record for a conversation that has no stored history.
    #[must_use]
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            messages: String::new(),
            last_modified: Utc::now(),
        }
    }

    /// Whether any history has been stored.
    #[must_use]
    pub fn has_history(&self) -> bool {
        !self.messages.trim().is_empty()
    }

    /// Replace the history blob and bump the timestamp.
    pub fn update(&mut self, messages: String) {
        self.messages = messages;
        self.last_modified = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_empty() {
        let before = Utc::now();
        let record = ConversationRecord::new("CH123");
        assert_eq!(record.conversation_id, "CH123");
        assert!(!record.has_history());
        assert!(record.last_modified >= before);
    }

    #[test]
    fn test_update_replaces_history() {
        let mut record = ConversationRecord::new("CH123");
        let created = record.last_modified;
        record.update("[]".to_string());
        record.update("[{\"role\":\"user\",\"parts\":[]}]".to_string());
        assert!(record.has_history());
        assert!(record.messages.starts_with("[{"));
        assert!(record.last_modified >= created);
    }
}
