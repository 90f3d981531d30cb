use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::JobSummary;

/// Opaque message identity, unique within one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub jobs: Option<Vec<JobSummary>>,
    /// True only for the placeholder currently receiving stream output.
    pub in_flight: bool,
}

impl Message {
    fn new(id: MessageId, role: Role, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role,
            content,
            created_at,
            jobs: None,
            in_flight: false,
        }
    }

    pub fn jobs(&self) -> &[JobSummary] {
        self.jobs.as_deref().unwrap_or_default()
    }
}

/// Append-only, copy-on-write message sequence.
///
/// Cloning a `Conversation` is cheap and yields a snapshot: later mutations
/// through the source value copy the underlying sequence instead of touching what
/// the snapshot sees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conversation {
    messages: Arc<Vec<Message>>,
    next_seq: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| &message.id == id)
    }

    /// Appends a finished system message (prompt or notice).
    pub fn append_system_message(
        &mut self,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> MessageId {
        let id = self.fresh_id();
        Arc::make_mut(&mut self.messages).push(Message::new(
            id.clone(),
            Role::System,
            text.into(),
            at,
        ));
        id
    }

    /// Appends the user message and, right after it, an empty in-flight
    /// assistant placeholder. Returns the placeholder's identity.
    pub fn append_user_message(&mut self, text: impl Into<String>, at: DateTime<Utc>) -> MessageId {
        let user_id = self.fresh_id();
        let placeholder_id = self.fresh_id();
        let mut placeholder =
            Message::new(placeholder_id.clone(), Role::Assistant, String::new(), at);
        placeholder.in_flight = true;

        let messages = Arc::make_mut(&mut self.messages);
        messages.push(Message::new(user_id, Role::User, text.into(), at));
        messages.push(placeholder);
        placeholder_id
    }

    /// Concatenates `delta` onto an in-flight message. Unknown or finished
    /// messages are left alone; returns whether anything changed.
    pub fn append_text_delta(&mut self, id: &MessageId, delta: &str) -> bool {
        if delta.is_empty() {
            return false;
        }
        self.with_in_flight(id, |message| message.content.push_str(delta))
    }

    /// Replaces the job list attached to an in-flight message.
    pub fn set_jobs(&mut self, id: &MessageId, jobs: Vec<JobSummary>) -> bool {
        self.with_in_flight(id, |message| message.jobs = Some(jobs))
    }

    /// Appends a human-readable failure note to an in-flight message.
    pub fn mark_errored(&mut self, id: &MessageId, note: &str) -> bool {
        self.with_in_flight(id, |message| {
            if !message.content.is_empty() {
                message.content.push_str("\n\n");
            }
            message.content.push_str(note);
        })
    }

    /// Freezes the message: no further deltas, jobs or notes apply to it.
    pub fn finish(&mut self, id: &MessageId) -> bool {
        self.with_in_flight(id, |message| message.in_flight = false)
    }

    fn with_in_flight(&mut self, id: &MessageId, apply: impl FnOnce(&mut Message)) -> bool {
        let Some(index) = self
            .messages
            .iter()
            .position(|message| &message.id == id && message.in_flight)
        else {
            return false;
        };
        apply(&mut Arc::make_mut(&mut self.messages)[index]);
        true
    }

    fn fresh_id(&mut self) -> MessageId {
        self.next_seq += 1;
        MessageId(format!("msg-{}", self.next_seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn user_message_is_followed_by_placeholder() {
        let mut conversation = Conversation::new();
        let placeholder = conversation.append_user_message("hi", at());

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[1].id, placeholder);
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].content.is_empty());
        assert!(messages[1].in_flight);
        assert_ne!(messages[0].id, messages[1].id);
    }

    #[test]
    fn snapshot_is_not_affected_by_later_mutation() {
        let mut conversation = Conversation::new();
        let id = conversation.append_user_message("hi", at());
        let snapshot = conversation.clone();

        assert!(conversation.append_text_delta(&id, "hello"));
        assert_eq!(snapshot.get(&id).unwrap().content, "");
        assert_eq!(conversation.get(&id).unwrap().content, "hello");
    }

    #[test]
    fn finished_message_rejects_further_updates() {
        let mut conversation = Conversation::new();
        let id = conversation.append_user_message("hi", at());
        conversation.append_text_delta(&id, "done");
        assert!(conversation.finish(&id));

        assert!(!conversation.append_text_delta(&id, "more"));
        assert!(!conversation.set_jobs(&id, Vec::new()));
        assert!(!conversation.mark_errored(&id, "oops"));
        assert_eq!(conversation.get(&id).unwrap().content, "done");
        assert!(conversation.get(&id).unwrap().jobs.is_none());
    }

    #[test]
    fn unknown_id_is_a_noop() {
        let mut conversation = Conversation::new();
        conversation.append_user_message("hi", at());
        let before = conversation.clone();
        assert!(!conversation.append_text_delta(&MessageId::new("nope"), "x"));
        assert_eq!(before, conversation);
    }

    #[test]
    fn error_note_is_separated_from_partial_text() {
        let mut conversation = Conversation::new();
        let id = conversation.append_user_message("hi", at());
        conversation.mark_errored(&id, "Sorry.");
        assert_eq!(conversation.get(&id).unwrap().content, "Sorry.");

        let id = conversation.append_user_message("again", at());
        conversation.append_text_delta(&id, "Partial");
        conversation.mark_errored(&id, "Sorry.");
        assert_eq!(conversation.get(&id).unwrap().content, "Partial\n\nSorry.");
    }
}
