use crate::config::MarketplaceConfig;
use crate::domain::completion::JobCompletion;
use crate::domain::fees::FeeSchedule;
use crate::domain::ids::{JobId, UserId};
use crate::domain::job::{Job, JobDraft, JobFilter, JobPatch, JobStatus};
use crate::domain::lifecycle::{self, JobAction};
use crate::domain::payment::{Payment, PaymentChannel, PaymentFilter};
use crate::domain::ports::Stores;
use crate::domain::user::{Role, User};
use crate::error::{OddJobsError, Result};
use chrono::Utc;
use tracing::{debug, info};

/// The marketplace service.
///
/// Owns the store handles and exposes every operation the dashboards call.
/// Create one at process start and pass it by reference; it holds no other
/// shared state. Every job status change goes through
/// [`lifecycle::next_status`] and every job write is a compare-and-swap on
/// the job's version.
pub struct Marketplace {
    pub(crate) stores: Stores,
    pub(crate) fees: FeeSchedule,
    pub(crate) channel: PaymentChannel,
}

impl Marketplace {
    /// Creates a marketplace with the default fee schedule and payment channel.
    pub fn new(stores: Stores) -> Self {
        let config = MarketplaceConfig::default();
        Self {
            stores,
            fees: FeeSchedule::default(),
            channel: config.payment_channel(),
        }
    }

    pub fn with_config(stores: Stores, config: &MarketplaceConfig) -> Result<Self> {
        Ok(Self {
            stores,
            fees: config.fee_schedule()?,
            channel: config.payment_channel(),
        })
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn currency(&self) -> &str {
        &self.channel.currency
    }

    pub async fn register_user(&self, user: User) -> Result<()> {
        info!(user = %user.id, role = %user.role, "registering user");
        self.stores.users.insert(user).await
    }

    pub async fn user(&self, user_id: UserId) -> Result<User> {
        self.stores
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| OddJobsError::NotFound(format!("User {user_id}")))
    }

    /// All users ordered by id.
    pub async fn users(&self) -> Result<Vec<User>> {
        let mut users = self.stores.users.get_all().await?;
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    pub async fn job(&self, job_id: JobId) -> Result<Job> {
        self.stores
            .jobs
            .get(job_id)
            .await?
            .ok_or_else(|| OddJobsError::NotFound(format!("Job {job_id}")))
    }

    /// Jobs matching `filter`, ordered by id.
    pub async fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .stores
            .jobs
            .get_all()
            .await?
            .into_iter()
            .filter(|job| filter.matches(job))
            .collect();
        jobs.sort_by_key(|job| job.id);
        Ok(jobs)
    }

    /// Payments matching `filter`, ordered by job, then type, then creation.
    pub async fn payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .stores
            .payments
            .get_all()
            .await?
            .into_iter()
            .filter(|payment| filter.matches(payment))
            .collect();
        payments.sort_by_key(|p| (p.job_id, p.r#type, p.created_at));
        Ok(payments)
    }

    pub async fn completion(&self, job_id: JobId) -> Result<Option<JobCompletion>> {
        self.stores.completions.get(job_id).await
    }

    /// Posts a new job on behalf of an employer.
    pub async fn create_job(&self, actor: UserId, job_id: JobId, draft: JobDraft) -> Result<Job> {
        let employer = self.user(actor).await?;
        employer.require_role(Role::Employer)?;

        let job = Job::new(job_id, employer.id, draft)?;
        self.stores.jobs.insert(job.clone()).await?;
        info!(job = %job.id, employer = %employer.id, "job posted");
        Ok(job)
    }

    /// Edits a job's details. Budget changes are only accepted while posted.
    pub async fn update_job(&self, actor: UserId, job_id: JobId, patch: JobPatch) -> Result<Job> {
        let mut job = self.job(job_id).await?;
        require_employer(&job, actor)?;
        job.apply_patch(patch)?;
        self.stores.jobs.update(job).await
    }

    /// posted -> assigned
    pub async fn assign(&self, actor: UserId, job_id: JobId, worker_id: UserId) -> Result<Job> {
        let mut job = self.job(job_id).await?;
        require_employer(&job, actor)?;
        let worker = self.user(worker_id).await?;
        worker.require_role(Role::Worker)?;

        job.status = lifecycle::next_status(job.id, job.status, JobAction::Assign, false)?;
        job.worker_id = Some(worker.id);
        job.updated_at = Utc::now();
        let job = self.stores.jobs.update(job).await?;
        info!(job = %job.id, worker = %worker.id, "worker assigned");
        Ok(job)
    }

    /// assigned -> in-progress
    pub async fn start(&self, actor: UserId, job_id: JobId) -> Result<Job> {
        let mut job = self.job(job_id).await?;
        require_assigned_worker(&job, actor)?;

        job.status = lifecycle::next_status(job.id, job.status, JobAction::Start, false)?;
        job.updated_at = Utc::now();
        let job = self.stores.jobs.update(job).await?;
        info!(job = %job.id, "work started");
        Ok(job)
    }

    /// Cancels an open job. Allowed for the job's employer and for admins.
    pub async fn cancel(
        &self,
        actor: UserId,
        job_id: JobId,
        reason: impl Into<String>,
    ) -> Result<Job> {
        let mut job = self.job(job_id).await?;
        let user = self.user(actor).await?;
        if user.role != Role::Admin {
            require_employer(&job, actor)?;
        }

        job.status = lifecycle::next_status(job.id, job.status, JobAction::Cancel, false)?;
        job.cancellation_reason = Some(reason.into());
        job.updated_at = Utc::now();
        let job = self.stores.jobs.update(job).await?;
        info!(job = %job.id, by = %actor, "job cancelled");
        Ok(job)
    }

    pub(crate) async fn require_admin(&self, actor: UserId) -> Result<User> {
        let user = self.user(actor).await?;
        user.require_role(Role::Admin)?;
        Ok(user)
    }

    pub(crate) async fn completion_or_new(
        &self,
        job: &Job,
        worker_id: UserId,
    ) -> Result<JobCompletion> {
        let completion = self.stores.completions.get(job.id).await?;
        Ok(completion.unwrap_or_else(|| {
            debug!(job = %job.id, "starting completion handshake");
            JobCompletion::new(job.id, job.employer_id, worker_id)
        }))
    }
}

pub(crate) fn require_employer(job: &Job, actor: UserId) -> Result<()> {
    if job.employer_id == actor {
        Ok(())
    } else {
        Err(OddJobsError::Forbidden(format!(
            "user {actor} does not own job {}",
            job.id
        )))
    }
}

/// Returns the assigned worker if `actor` is that worker.
pub(crate) fn require_assigned_worker(job: &Job, actor: UserId) -> Result<UserId> {
    match job.worker_id {
        Some(worker) if worker == actor => Ok(worker),
        _ => Err(OddJobsError::Forbidden(format!(
            "user {actor} is not the worker assigned to job {}",
            job.id
        ))),
    }
}
