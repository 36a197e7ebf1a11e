use crate::domain::completion::JobCompletion;
use crate::domain::conversation::Conversation;
use crate::domain::ids::{ConversationId, JobId, PaymentId, UserId};
use crate::domain::job::Job;
use crate::domain::payment::Payment;
use crate::domain::ports::{
    CompletionStore, ConversationStore, JobStore, PaymentStore, Stores, UserStore,
};
use crate::domain::user::User;
use crate::error::{OddJobsError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for registered users.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(OddJobsError::DuplicateId(format!("User {}", user.id)));
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for jobs.
///
/// The write lock is held across the version check and the insert, which
/// makes `update` a proper compare-and-swap.
#[derive(Default, Clone)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(OddJobsError::DuplicateId(format!("Job {}", job.id)));
        }
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn update(&self, mut job: Job) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get(&job.id)
            .ok_or_else(|| OddJobsError::NotFound(format!("Job {}", job.id)))?;
        if stored.version != job.version {
            return Err(OddJobsError::VersionConflict {
                job: job.id,
                expected: job.version,
                found: stored.version,
            });
        }
        job.version += 1;
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get(&self, job_id: JobId) -> Result<Option<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(&job_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCompletionStore {
    completions: Arc<RwLock<HashMap<JobId, JobCompletion>>>,
}

impl InMemoryCompletionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionStore for InMemoryCompletionStore {
    async fn store(&self, completion: JobCompletion) -> Result<()> {
        let mut completions = self.completions.write().await;
        completions.insert(completion.job_id, completion);
        Ok(())
    }

    async fn get(&self, job_id: JobId) -> Result<Option<JobCompletion>> {
        let completions = self.completions.read().await;
        Ok(completions.get(&job_id).cloned())
    }
}

/// A thread-safe in-memory payment ledger.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn store(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&payment_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryConversationStore {
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn store(&self, conversation: Conversation) -> Result<()> {
        let mut conversations = self.conversations.write().await;
        conversations.insert(conversation.id, conversation);
        Ok(())
    }

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(&conversation_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations.values().cloned().collect())
    }
}

impl Stores {
    /// Fresh, empty in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            users: Box::new(InMemoryUserStore::new()),
            jobs: Box::new(InMemoryJobStore::new()),
            completions: Box::new(InMemoryCompletionStore::new()),
            payments: Box::new(InMemoryPaymentStore::new()),
            conversations: Box::new(InMemoryConversationStore::new()),
        }
    }
}
