//! The completion handshake and the payment follow-ups it starts.

use super::marketplace::{Marketplace, require_assigned_worker, require_employer};
use crate::domain::completion::{JobCompletion, Review};
use crate::domain::fees::PaymentBreakdown;
use crate::domain::ids::{JobId, PaymentId, UserId};
use crate::domain::job::Job;
use crate::domain::lifecycle::{self, JobAction};
use crate::domain::payment::{Payment, PaymentChannel, PaymentFilter, PaymentStatus, PaymentType};
use crate::error::{OddJobsError, Result};
use chrono::Utc;
use tracing::{info, warn};

/// Everything `approve_work` produced.
#[derive(Debug, Clone)]
pub struct Approval {
    pub job: Job,
    pub completion: JobCompletion,
    pub breakdown: PaymentBreakdown,
    /// The job payment, followed by the tip payment when a tip was given.
    pub payments: Vec<Payment>,
}

impl Marketplace {
    /// The assigned worker declares the work finished. Status stays
    /// in-progress until the employer approves.
    pub async fn mark_worker_done(&self, actor: UserId, job_id: JobId) -> Result<JobCompletion> {
        let mut job = self.job(job_id).await?;
        let worker = require_assigned_worker(&job, actor)?;
        let mut completion = self.completion_or_new(&job, worker).await?;

        job.status = lifecycle::next_status(
            job.id,
            job.status,
            JobAction::SubmitWork,
            completion.worker_confirmed,
        )?;
        job.updated_at = Utc::now();
        self.stores.jobs.update(job).await?;

        completion.confirm_by_worker();
        self.stores.completions.store(completion.clone()).await?;
        info!(job = %job_id, worker = %worker, "work submitted for review");
        Ok(completion)
    }

    /// The employer sends submitted work back. The worker has to submit again.
    pub async fn request_revision(
        &self,
        actor: UserId,
        job_id: JobId,
        reason: &str,
    ) -> Result<JobCompletion> {
        let mut job = self.job(job_id).await?;
        require_employer(&job, actor)?;
        let stored = self.stores.completions.get(job.id).await?;

        job.status = lifecycle::next_status(
            job.id,
            job.status,
            JobAction::RequestRevision,
            work_submitted(stored.as_ref()),
        )?;
        let mut completion = stored.ok_or(OddJobsError::WorkNotSubmitted(job.id))?;
        job.updated_at = Utc::now();
        self.stores.jobs.update(job).await?;

        completion.request_revision();
        self.stores.completions.store(completion.clone()).await?;
        info!(job = %job_id, revision = completion.revision_count, reason, "revision requested");
        Ok(completion)
    }

    /// The employer accepts submitted work.
    ///
    /// Computes the payment, completes the job and records a processing job
    /// payment plus a processing tip when `review.tip` is non-zero. The job
    /// write is the compare-and-swap point: if it loses a race nothing else
    /// is recorded.
    pub async fn approve_work(
        &self,
        actor: UserId,
        job_id: JobId,
        review: Review,
    ) -> Result<Approval> {
        let mut job = self.job(job_id).await?;
        require_employer(&job, actor)?;
        let stored = self.stores.completions.get(job.id).await?;

        job.status = lifecycle::next_status(
            job.id,
            job.status,
            JobAction::Approve,
            work_submitted(stored.as_ref()),
        )?;
        let mut completion = stored.ok_or(OddJobsError::WorkNotSubmitted(job.id))?;
        completion.approve(review.clone())?;
        let worker = completion.worker_id;
        let breakdown = self.fees.breakdown(job.payable_amount(), review.tip);

        let now = Utc::now();
        job.completed_at = Some(now);
        job.updated_at = now;
        job.rating = Some(review.rating.value());
        let job = self.stores.jobs.update(job).await?;

        // Payments are charged in the currency the job was budgeted in.
        let channel = PaymentChannel {
            currency: job.budget.currency.clone(),
            ..self.channel.clone()
        };
        let mut payments = vec![Payment::job_payment(
            job.id,
            job.employer_id,
            worker,
            breakdown.job_amount,
            &self.fees,
            &channel,
        )];
        if !review.tip.is_zero() {
            payments.push(Payment::tip(
                job.id,
                job.employer_id,
                worker,
                review.tip,
                &channel,
            ));
        }
        for payment in &mut payments {
            payment.begin_processing()?;
            self.stores.payments.store(payment.clone()).await?;
        }
        self.stores.completions.store(completion.clone()).await?;

        info!(
            job = %job.id,
            employer_total = %breakdown.employer_total,
            worker_net = %breakdown.worker_net,
            "work approved"
        );
        Ok(Approval {
            job,
            completion,
            breakdown,
            payments,
        })
    }

    /// Settles every processing payment of a job. The job payment itself
    /// must be processing; a tip never settles on its own.
    pub async fn confirm_payment(&self, actor: UserId, job_id: JobId) -> Result<Vec<Payment>> {
        let job = self.job(job_id).await?;
        require_employer(&job, actor)?;

        let job_payment = self.job_payment(job_id).await?;
        if job_payment.status != PaymentStatus::Processing {
            return Err(OddJobsError::InvalidPaymentState {
                payment: job_payment.id,
                status: job_payment.status,
                expected: PaymentStatus::Processing,
            });
        }

        let filter = PaymentFilter {
            job: Some(job_id),
            status: Some(PaymentStatus::Processing),
            ..Default::default()
        };
        let mut payments = self.payments(&filter).await?;
        for payment in &mut payments {
            payment.complete()?;
            self.stores.payments.store(payment.clone()).await?;
            info!(payment = %payment.id, job = %job_id, "payment completed");
        }
        Ok(payments)
    }

    /// Marks a processing payment as failed. Admin only.
    pub async fn fail_payment(
        &self,
        actor: UserId,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<Payment> {
        self.require_admin(actor).await?;
        let mut payment = self.payment(payment_id).await?;
        payment.fail(reason)?;
        self.stores.payments.store(payment.clone()).await?;
        warn!(payment = %payment.id, job = %payment.job_id, reason, "payment failed");
        Ok(payment)
    }

    /// Puts a failed payment back into processing. Only the paying employer
    /// may retry; nothing is retried automatically.
    pub async fn retry_payment(&self, actor: UserId, payment_id: PaymentId) -> Result<Payment> {
        let mut payment = self.payment(payment_id).await?;
        if payment.employer_id != actor {
            return Err(OddJobsError::Forbidden(format!(
                "user {actor} did not make payment {payment_id}"
            )));
        }
        payment.retry()?;
        self.stores.payments.store(payment.clone()).await?;
        info!(payment = %payment.id, "payment retried");
        Ok(payment)
    }

    /// Refunds a completed job payment in full. Admin only, once per job.
    pub async fn refund_payment(
        &self,
        actor: UserId,
        payment_id: PaymentId,
        reason: &str,
    ) -> Result<Payment> {
        self.require_admin(actor).await?;
        let original = self.payment(payment_id).await?;
        if original.r#type != PaymentType::JobPayment {
            return Err(OddJobsError::ValidationError(format!(
                "Only job payments can be refunded, {} is a {}",
                original.id, original.r#type
            )));
        }
        if original.status != PaymentStatus::Completed {
            return Err(OddJobsError::InvalidPaymentState {
                payment: original.id,
                status: original.status,
                expected: PaymentStatus::Completed,
            });
        }
        let existing = self
            .payments(&PaymentFilter {
                job: Some(original.job_id),
                r#type: Some(PaymentType::Refund),
                ..Default::default()
            })
            .await?;
        if !existing.is_empty() {
            return Err(OddJobsError::DuplicateId(format!(
                "Refund for job {}",
                original.job_id
            )));
        }

        let refund = Payment::refund_of(&original, reason);
        self.stores.payments.store(refund.clone()).await?;
        info!(job = %refund.job_id, amount = %refund.amount, reason, "payment refunded");
        Ok(refund)
    }

    pub async fn payment(&self, payment_id: PaymentId) -> Result<Payment> {
        self.stores
            .payments
            .get(payment_id)
            .await?
            .ok_or_else(|| OddJobsError::NotFound(format!("Payment {payment_id}")))
    }

    /// The job payment created when `job_id` was approved.
    pub async fn job_payment(&self, job_id: JobId) -> Result<Payment> {
        let filter = PaymentFilter {
            job: Some(job_id),
            r#type: Some(PaymentType::JobPayment),
            ..Default::default()
        };
        self.payments(&filter)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OddJobsError::NotFound(format!("Job payment for job {job_id}")))
    }
}

fn work_submitted(completion: Option<&JobCompletion>) -> bool {
    completion.is_some_and(|c| c.worker_confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::marketplace::tests::{
        ADMIN, EMPLOYER, JOB, OTHER_WORKER, WORKER, in_progress, seeded,
    };
    use crate::domain::completion::Rating;
    use crate::domain::job::{Budget, JobDraft, JobStatus};
    use crate::domain::money::Amount;
    use crate::domain::ports::{JobStore, JobStoreBox};
    use crate::infrastructure::in_memory::InMemoryJobStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    fn review(tip: rust_decimal::Decimal) -> Review {
        Review {
            rating: Rating::new(4).unwrap(),
            comment: "Good work".to_string(),
            tip: Amount::new(tip).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_full_handshake_with_tip() {
        let market = in_progress().await;

        let completion = market.mark_worker_done(WORKER, JOB).await.unwrap();
        assert!(completion.worker_confirmed);
        assert_eq!(market.job(JOB).await.unwrap().status, JobStatus::InProgress);

        let approval = market.approve_work(EMPLOYER, JOB, review(dec!(50))).await.unwrap();
        assert_eq!(approval.job.status, JobStatus::Completed);
        assert!(approval.job.completed_at.is_some());
        assert_eq!(approval.job.rating, Some(4));
        assert!(approval.completion.payment_triggered);

        assert_eq!(approval.breakdown.platform_fee.value(), dec!(75));
        assert_eq!(approval.breakdown.employer_total.value(), dec!(625));
        assert_eq!(approval.breakdown.worker_net.value(), dec!(550));

        assert_eq!(approval.payments.len(), 2);
        let job_payment = &approval.payments[0];
        assert_eq!(job_payment.r#type, PaymentType::JobPayment);
        assert_eq!(job_payment.status, PaymentStatus::Processing);
        assert_eq!(
            job_payment.total_amount,
            job_payment.amount + job_payment.platform_fee
        );
        assert_eq!(approval.payments[1].r#type, PaymentType::Tip);
        assert_eq!(approval.payments[1].total_amount.value(), dec!(50));
    }

    #[tokio::test]
    async fn test_no_tip_payment_for_zero_tip() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();
        let approval = market.approve_work(EMPLOYER, JOB, review(dec!(0))).await.unwrap();
        assert_eq!(approval.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_approve_before_worker_done_rejected() {
        let market = in_progress().await;

        let result = market.approve_work(EMPLOYER, JOB, review(dec!(0))).await;
        assert!(matches!(result, Err(OddJobsError::WorkNotSubmitted(_))));
        assert_eq!(market.job(JOB).await.unwrap().status, JobStatus::InProgress);
        assert!(market.payments(&PaymentFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approve_on_posted_job_rejected() {
        let market = seeded().await;
        let result = market.approve_work(EMPLOYER, JOB, review(dec!(0))).await;
        assert!(matches!(
            result,
            Err(OddJobsError::InvalidTransition {
                from: JobStatus::Posted,
                action: JobAction::Approve,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_review_actions_on_cancelled_job_rejected() {
        let market = seeded().await;
        market.cancel(EMPLOYER, JOB, "found someone else").await.unwrap();

        assert!(matches!(
            market.approve_work(EMPLOYER, JOB, review(dec!(0))).await,
            Err(OddJobsError::InvalidTransition {
                from: JobStatus::Cancelled,
                action: JobAction::Approve,
                ..
            })
        ));
        assert!(matches!(
            market.request_revision(EMPLOYER, JOB, "redo").await,
            Err(OddJobsError::InvalidTransition {
                from: JobStatus::Cancelled,
                action: JobAction::RequestRevision,
                ..
            })
        ));
        assert!(market.payments(&PaymentFilter::for_job(JOB)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payments_use_job_currency() {
        let market = seeded().await;
        let usd_job = JobId(101);
        let budget = Budget::new(
            Amount::new(dec!(40)).unwrap(),
            Amount::new(dec!(60)).unwrap(),
            "USD",
        )
        .unwrap();
        market
            .create_job(EMPLOYER, usd_job, JobDraft::new("Translate menu", budget))
            .await
            .unwrap();
        market.assign(EMPLOYER, usd_job, WORKER).await.unwrap();
        market.start(WORKER, usd_job).await.unwrap();
        market.mark_worker_done(WORKER, usd_job).await.unwrap();

        let approval = market
            .approve_work(EMPLOYER, usd_job, review(dec!(5)))
            .await
            .unwrap();
        assert_eq!(approval.payments.len(), 2);
        for payment in &approval.payments {
            assert_eq!(payment.currency, "USD");
        }
        assert_eq!(market.currency(), "ZAR");
    }

    #[tokio::test]
    async fn test_revision_requires_resubmission() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();

        let completion = market
            .request_revision(EMPLOYER, JOB, "missed the back yard")
            .await
            .unwrap();
        assert!(!completion.worker_confirmed);
        assert_eq!(completion.revision_count, 1);
        assert_eq!(market.job(JOB).await.unwrap().status, JobStatus::InProgress);

        assert!(matches!(
            market.approve_work(EMPLOYER, JOB, review(dec!(0))).await,
            Err(OddJobsError::WorkNotSubmitted(_))
        ));

        market.mark_worker_done(WORKER, JOB).await.unwrap();
        let approval = market.approve_work(EMPLOYER, JOB, review(dec!(0))).await.unwrap();
        assert_eq!(approval.completion.revision_count, 1);
    }

    #[tokio::test]
    async fn test_double_submit_rejected() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();
        assert!(matches!(
            market.mark_worker_done(WORKER, JOB).await,
            Err(OddJobsError::WorkAlreadySubmitted(_))
        ));
    }

    #[tokio::test]
    async fn test_only_assigned_worker_can_submit() {
        let market = in_progress().await;
        assert!(matches!(
            market.mark_worker_done(OTHER_WORKER, JOB).await,
            Err(OddJobsError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_completed_job_cannot_be_cancelled() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();
        market.approve_work(EMPLOYER, JOB, review(dec!(0))).await.unwrap();

        assert!(matches!(
            market.cancel(EMPLOYER, JOB, "changed mind").await,
            Err(OddJobsError::InvalidTransition { .. })
        ));
        assert!(matches!(
            market.approve_work(EMPLOYER, JOB, review(dec!(0))).await,
            Err(OddJobsError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_confirm_fail_retry_refund() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();
        market.approve_work(EMPLOYER, JOB, review(dec!(0))).await.unwrap();
        let payment = market.job_payment(JOB).await.unwrap();

        // Refund needs a completed payment.
        assert!(matches!(
            market.refund_payment(ADMIN, payment.id, "dispute").await,
            Err(OddJobsError::InvalidPaymentState { .. })
        ));

        // Only admins fail payments.
        assert!(matches!(
            market.fail_payment(EMPLOYER, payment.id, "declined").await,
            Err(OddJobsError::Forbidden(_))
        ));
        let failed = market.fail_payment(ADMIN, payment.id, "declined").await.unwrap();
        assert_eq!(failed.status, PaymentStatus::Failed);
        assert!(market.confirm_payment(EMPLOYER, JOB).await.is_err());

        let retried = market.retry_payment(EMPLOYER, payment.id).await.unwrap();
        assert_eq!(retried.status, PaymentStatus::Processing);

        let settled = market.confirm_payment(EMPLOYER, JOB).await.unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].status, PaymentStatus::Completed);
        assert!(settled[0].transaction_id.is_some());

        let refund = market.refund_payment(ADMIN, payment.id, "dispute").await.unwrap();
        assert_eq!(refund.amount.value(), dec!(575));
        assert!(matches!(
            market.refund_payment(ADMIN, payment.id, "again").await,
            Err(OddJobsError::DuplicateId(_))
        ));
    }

    #[tokio::test]
    async fn test_tip_waits_for_failed_job_payment() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();
        market.approve_work(EMPLOYER, JOB, review(dec!(50))).await.unwrap();
        let payment = market.job_payment(JOB).await.unwrap();
        market.fail_payment(ADMIN, payment.id, "declined").await.unwrap();

        assert!(matches!(
            market.confirm_payment(EMPLOYER, JOB).await,
            Err(OddJobsError::InvalidPaymentState {
                status: PaymentStatus::Failed,
                expected: PaymentStatus::Processing,
                ..
            })
        ));
        let tip = PaymentFilter {
            r#type: Some(PaymentType::Tip),
            ..PaymentFilter::for_job(JOB)
        };
        let tips = market.payments(&tip).await.unwrap();
        assert_eq!(tips[0].status, PaymentStatus::Processing);
        let summary = market.worker_summary(WORKER).await.unwrap();
        assert_eq!(summary.total_earned, Amount::ZERO);

        market.retry_payment(EMPLOYER, payment.id).await.unwrap();
        let settled = market.confirm_payment(EMPLOYER, JOB).await.unwrap();
        assert_eq!(settled.len(), 2);
        assert!(settled.iter().all(|p| p.status == PaymentStatus::Completed));
    }

    #[tokio::test]
    async fn test_stale_job_write_loses() {
        let market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();

        // A writer holding the job from before the handshake.
        let mut stale = market.job(JOB).await.unwrap();
        stale.version -= 1;
        stale.title = "Renamed".to_string();
        assert!(matches!(
            market.stores.jobs.update(stale).await,
            Err(OddJobsError::VersionConflict { .. })
        ));

        market.approve_work(EMPLOYER, JOB, review(dec!(0))).await.unwrap();
        assert_eq!(market.job(JOB).await.unwrap().title, "Garden cleanup");
    }

    /// Lets another writer update the job right after every read.
    struct ContendedJobStore {
        inner: JobStoreBox,
    }

    #[async_trait]
    impl JobStore for ContendedJobStore {
        async fn insert(&self, job: Job) -> Result<()> {
            self.inner.insert(job).await
        }

        async fn update(&self, job: Job) -> Result<Job> {
            self.inner.update(job).await
        }

        async fn get(&self, job_id: JobId) -> Result<Option<Job>> {
            let seen = self.inner.get(job_id).await?;
            if let Some(job) = seen.clone() {
                self.inner.update(job).await?;
            }
            Ok(seen)
        }

        async fn get_all(&self) -> Result<Vec<Job>> {
            self.inner.get_all().await
        }
    }

    #[tokio::test]
    async fn test_approval_losing_race_records_nothing() {
        let mut market = in_progress().await;
        market.mark_worker_done(WORKER, JOB).await.unwrap();

        let inner = std::mem::replace(&mut market.stores.jobs, Box::new(InMemoryJobStore::new()));
        market.stores.jobs = Box::new(ContendedJobStore { inner });

        assert!(matches!(
            market.approve_work(EMPLOYER, JOB, review(dec!(50))).await,
            Err(OddJobsError::VersionConflict { .. })
        ));
        assert!(market.payments(&PaymentFilter::for_job(JOB)).await.unwrap().is_empty());
        let completion = market.completion(JOB).await.unwrap().unwrap();
        assert!(completion.worker_confirmed);
        assert!(!completion.employer_confirmed);
        assert!(!completion.payment_triggered);
    }
}
