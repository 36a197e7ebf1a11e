use super::marketplace::Marketplace;
use crate::domain::conversation::{Conversation, Message};
use crate::domain::ids::{ConversationId, JobId, UserId};
use crate::error::{OddJobsError, Result};
use tracing::debug;

impl Marketplace {
    /// Appends a message to the conversation between `sender` and
    /// `recipient` about `job`, opening the conversation if needed.
    pub async fn send_message(
        &self,
        sender: UserId,
        recipient: UserId,
        job: Option<JobId>,
        content: &str,
    ) -> Result<Conversation> {
        self.user(sender).await?;
        self.user(recipient).await?;
        if let Some(job_id) = job {
            self.job(job_id).await?;
        }

        let existing = self
            .stores
            .conversations
            .get_all()
            .await?
            .into_iter()
            .find(|c| c.is_between(sender, recipient, job));
        let mut conversation = match existing {
            Some(conversation) => conversation,
            None => Conversation::new(sender, recipient, job)?,
        };

        conversation.append(sender, content)?;
        self.stores.conversations.store(conversation.clone()).await?;
        debug!(conversation = %conversation.id, from = %sender, to = %recipient, "message sent");
        Ok(conversation)
    }

    /// Conversations `user` takes part in, most recently active first.
    pub async fn conversations_for(&self, user: UserId) -> Result<Vec<Conversation>> {
        let mut conversations: Vec<Conversation> = self
            .stores
            .conversations
            .get_all()
            .await?
            .into_iter()
            .filter(|c| c.includes(user))
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    pub async fn messages(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
    ) -> Result<Vec<Message>> {
        let conversation = self.conversation(conversation_id).await?;
        conversation.require_participant(reader)?;
        Ok(conversation.messages)
    }

    /// Marks messages addressed to `reader` as read; returns how many changed.
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
    ) -> Result<usize> {
        let mut conversation = self.conversation(conversation_id).await?;
        let changed = conversation.mark_read(reader)?;
        if changed > 0 {
            self.stores.conversations.store(conversation).await?;
        }
        Ok(changed)
    }

    async fn conversation(&self, conversation_id: ConversationId) -> Result<Conversation> {
        self.stores
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| OddJobsError::NotFound(format!("Conversation {conversation_id}")))
    }
}
