use super::completion::JobCompletion;
use super::conversation::Conversation;
use super::ids::{ConversationId, JobId, PaymentId, UserId};
use super::job::Job;
use super::payment::Payment;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user; fails with `DuplicateId` if the id is taken.
    async fn insert(&self, user: User) -> Result<()>;
    async fn get(&self, user_id: UserId) -> Result<Option<User>>;
    async fn get_all(&self) -> Result<Vec<User>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new job; fails with `DuplicateId` if the id is taken.
    async fn insert(&self, job: Job) -> Result<()>;
    /// Compare-and-swap write. `job.version` must equal the stored version;
    /// the stored copy gets `version + 1` and is returned.
    async fn update(&self, job: Job) -> Result<Job>;
    async fn get(&self, job_id: JobId) -> Result<Option<Job>>;
    async fn get_all(&self) -> Result<Vec<Job>>;
}

#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn store(&self, completion: JobCompletion) -> Result<()>;
    async fn get(&self, job_id: JobId) -> Result<Option<JobCompletion>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn store(&self, payment: Payment) -> Result<()>;
    async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>>;
    async fn get_all(&self) -> Result<Vec<Payment>>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn store(&self, conversation: Conversation) -> Result<()>;
    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Conversation>>;
    async fn get_all(&self) -> Result<Vec<Conversation>>;
}

pub type UserStoreBox = Box<dyn UserStore>;
pub type JobStoreBox = Box<dyn JobStore>;
pub type CompletionStoreBox = Box<dyn CompletionStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type ConversationStoreBox = Box<dyn ConversationStore>;

/// Every store the marketplace needs, usually backed by one adapter.
pub struct Stores {
    pub users: UserStoreBox,
    pub jobs: JobStoreBox,
    pub completions: CompletionStoreBox,
    pub payments: PaymentStoreBox,
    pub conversations: ConversationStoreBox,
}
