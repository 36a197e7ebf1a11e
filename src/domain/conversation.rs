use super::ids::{ConversationId, JobId, MessageId, UserId};
use crate::error::{OddJobsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// Append-only message log between two users, optionally about one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub job_id: Option<JobId>,
    pub participants: [UserId; 2],
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(a: UserId, b: UserId, job_id: Option<JobId>) -> Result<Self> {
        if a == b {
            return Err(OddJobsError::ValidationError(
                "A conversation needs two different participants".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: ConversationId::generate(),
            job_id,
            participants: [a.min(b), a.max(b)],
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn includes(&self, user: UserId) -> bool {
        self.participants.contains(&user)
    }

    /// Whether this is the thread for `a` and `b` about `job_id`.
    pub fn is_between(&self, a: UserId, b: UserId, job_id: Option<JobId>) -> bool {
        self.participants == [a.min(b), a.max(b)] && self.job_id == job_id
    }

    pub fn require_participant(&self, user: UserId) -> Result<()> {
        if self.includes(user) {
            Ok(())
        } else {
            Err(OddJobsError::Forbidden(format!(
                "user {} is not part of conversation {}",
                user, self.id
            )))
        }
    }

    pub fn append(&mut self, sender: UserId, content: impl Into<String>) -> Result<&Message> {
        self.require_participant(sender)?;
        let content = content.into();
        if content.trim().is_empty() {
            return Err(OddJobsError::ValidationError(
                "Message must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        self.messages.push(Message {
            id: MessageId::generate(),
            sender,
            content,
            sent_at: now,
            read: false,
        });
        self.updated_at = now;
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Marks everything sent to `reader` as read. Returns how many changed.
    pub fn mark_read(&mut self, reader: UserId) -> Result<usize> {
        self.require_participant(reader)?;
        let mut changed = 0;
        for message in self.messages.iter_mut().filter(|m| m.sender != reader && !m.read) {
            message.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    pub fn unread_for(&self, reader: UserId) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender != reader && !m.read)
            .count()
    }
}
