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
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CF_USERS: &str = "users";
pub const CF_JOBS: &str = "jobs";
pub const CF_COMPLETIONS: &str = "completions";
pub const CF_PAYMENTS: &str = "payments";
pub const CF_CONVERSATIONS: &str = "conversations";

const COLUMN_FAMILIES: [&str; 5] = [
    CF_USERS,
    CF_JOBS,
    CF_COMPLETIONS,
    CF_PAYMENTS,
    CF_CONVERSATIONS,
];

/// A persistent store implementation using RocksDB.
///
/// Every entity kind lives in its own column family as a JSON value. Keys
/// are big-endian integer ids or raw UUID bytes.
///
/// `Clone` shares the underlying `Arc<DB>`. Read-check-write sequences
/// (inserts and job compare-and-swap) are serialized by `write_lock`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, creating any missing
    /// column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// All marketplace stores backed by this database.
    pub fn stores(&self) -> Stores {
        Stores {
            users: Box::new(self.clone()),
            jobs: Box::new(self.clone()),
            completions: Box::new(self.clone()),
            payments: Box::new(self.clone()),
            conversations: Box::new(self.clone()),
        }
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.db.cf_handle(cf_name).ok_or_else(|| missing_cf(cf_name))?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(&cf, key, bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.db.cf_handle(cf_name).ok_or_else(|| missing_cf(cf_name))?;
        match self.db.get_pinned_cf(&cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn fetch_all<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.db.cf_handle(cf_name).ok_or_else(|| missing_cf(cf_name))?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, bytes) = item?;
            values.push(serde_json::from_slice(&bytes)?);
        }
        Ok(values)
    }

    fn contains(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.db.cf_handle(cf_name).ok_or_else(|| missing_cf(cf_name))?;
        Ok(self.db.get_pinned_cf(&cf, key)?.is_some())
    }
}

fn missing_cf(name: &str) -> OddJobsError {
    OddJobsError::InternalError(Box::new(std::io::Error::other(format!(
        "Column family {name} not found"
    ))))
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn insert(&self, user: User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = user.id.0.to_be_bytes();
        if self.contains(CF_USERS, &key)? {
            return Err(OddJobsError::DuplicateId(format!("User {}", user.id)));
        }
        self.put(CF_USERS, &key, &user)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        self.fetch(CF_USERS, &user_id.0.to_be_bytes())
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        self.fetch_all(CF_USERS)
    }
}

#[async_trait]
impl JobStore for RocksDBStore {
    async fn insert(&self, job: Job) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = job.id.0.to_be_bytes();
        if self.contains(CF_JOBS, &key)? {
            return Err(OddJobsError::DuplicateId(format!("Job {}", job.id)));
        }
        self.put(CF_JOBS, &key, &job)
    }

    async fn update(&self, mut job: Job) -> Result<Job> {
        let _guard = self.write_lock.lock().await;
        let key = job.id.0.to_be_bytes();
        let stored: Job = self
            .fetch(CF_JOBS, &key)?
            .ok_or_else(|| OddJobsError::NotFound(format!("Job {}", job.id)))?;
        if stored.version != job.version {
            return Err(OddJobsError::VersionConflict {
                job: job.id,
                expected: job.version,
                found: stored.version,
            });
        }
        job.version += 1;
        self.put(CF_JOBS, &key, &job)?;
        Ok(job)
    }

    async fn get(&self, job_id: JobId) -> Result<Option<Job>> {
        self.fetch(CF_JOBS, &job_id.0.to_be_bytes())
    }

    async fn get_all(&self) -> Result<Vec<Job>> {
        self.fetch_all(CF_JOBS)
    }
}

#[async_trait]
impl CompletionStore for RocksDBStore {
    async fn store(&self, completion: JobCompletion) -> Result<()> {
        self.put(CF_COMPLETIONS, &completion.job_id.0.to_be_bytes(), &completion)
    }

    async fn get(&self, job_id: JobId) -> Result<Option<JobCompletion>> {
        self.fetch(CF_COMPLETIONS, &job_id.0.to_be_bytes())
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn store(&self, payment: Payment) -> Result<()> {
        self.put(CF_PAYMENTS, payment.id.0.as_bytes(), &payment)
    }

    async fn get(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        self.fetch(CF_PAYMENTS, payment_id.0.as_bytes())
    }

    async fn get_all(&self) -> Result<Vec<Payment>> {
        self.fetch_all(CF_PAYMENTS)
    }
}

#[async_trait]
impl ConversationStore for RocksDBStore {
    async fn store(&self, conversation: Conversation) -> Result<()> {
        self.put(CF_CONVERSATIONS, conversation.id.0.as_bytes(), &conversation)
    }

    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Conversation>> {
        self.fetch(CF_CONVERSATIONS, conversation_id.0.as_bytes())
    }

    async fn get_all(&self) -> Result<Vec<Conversation>> {
        self.fetch_all(CF_CONVERSATIONS)
    }
}
