use super::fees::FeeSchedule;
use super::ids::{JobId, PaymentId, UserId};
use super::money::Amount;
use crate::error::{OddJobsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    JobPayment,
    Tip,
    Refund,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentType::JobPayment => "job_payment",
            PaymentType::Tip => "tip",
            PaymentType::Refund => "refund",
        };
        f.write_str(name)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Where the money comes from and who moves it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentChannel {
    pub method: String,
    pub provider: String,
    pub currency: String,
}

/// A single ledger entry between an employer and a worker.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub job_id: JobId,
    pub employer_id: UserId,
    pub worker_id: UserId,
    pub r#type: PaymentType,
    pub amount: Amount,
    pub platform_fee: Amount,
    pub total_amount: Amount,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub payment_provider: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl Payment {
    fn new(
        job_id: JobId,
        employer_id: UserId,
        worker_id: UserId,
        r#type: PaymentType,
        amount: Amount,
        platform_fee: Amount,
        channel: &PaymentChannel,
    ) -> Self {
        Self {
            id: PaymentId::generate(),
            job_id,
            employer_id,
            worker_id,
            r#type,
            amount,
            platform_fee,
            total_amount: amount + platform_fee,
            currency: channel.currency.clone(),
            status: PaymentStatus::Pending,
            payment_method: channel.method.clone(),
            payment_provider: channel.provider.clone(),
            transaction_id: None,
            created_at: Utc::now(),
            completed_at: None,
            reason: None,
        }
    }

    /// A pending payment for the job amount, with the platform fee on top.
    pub fn job_payment(
        job_id: JobId,
        employer_id: UserId,
        worker_id: UserId,
        amount: Amount,
        fees: &FeeSchedule,
        channel: &PaymentChannel,
    ) -> Self {
        let fee = fees.platform_fee(amount);
        Self::new(job_id, employer_id, worker_id, PaymentType::JobPayment, amount, fee, channel)
    }

    /// A pending tip; tips carry no platform fee.
    pub fn tip(
        job_id: JobId,
        employer_id: UserId,
        worker_id: UserId,
        amount: Amount,
        channel: &PaymentChannel,
    ) -> Self {
        Self::new(job_id, employer_id, worker_id, PaymentType::Tip, amount, Amount::ZERO, channel)
    }

    /// A completed refund of everything the employer paid for `original`.
    pub fn refund_of(original: &Payment, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::generate(),
            job_id: original.job_id,
            employer_id: original.employer_id,
            worker_id: original.worker_id,
            r#type: PaymentType::Refund,
            amount: original.total_amount,
            platform_fee: Amount::ZERO,
            total_amount: original.total_amount,
            currency: original.currency.clone(),
            status: PaymentStatus::Completed,
            payment_method: original.payment_method.clone(),
            payment_provider: original.payment_provider.clone(),
            transaction_id: Some(format!("REF-{}", original.id.0.simple())),
            created_at: now,
            completed_at: Some(now),
            reason: Some(reason.into()),
        }
    }

    fn expect_status(&self, expected: PaymentStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(OddJobsError::InvalidPaymentState {
                payment: self.id,
                status: self.status,
                expected,
            })
        }
    }

    /// pending -> processing
    pub fn begin_processing(&mut self) -> Result<()> {
        self.expect_status(PaymentStatus::Pending)?;
        self.status = PaymentStatus::Processing;
        Ok(())
    }

    /// failed -> processing
    pub fn retry(&mut self) -> Result<()> {
        self.expect_status(PaymentStatus::Failed)?;
        self.status = PaymentStatus::Processing;
        self.reason = None;
        Ok(())
    }

    /// processing -> completed
    pub fn complete(&mut self) -> Result<()> {
        self.expect_status(PaymentStatus::Processing)?;
        self.status = PaymentStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.transaction_id = Some(format!("TXN-{}", self.id.0.simple()));
        Ok(())
    }

    /// processing -> failed
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.expect_status(PaymentStatus::Processing)?;
        self.status = PaymentStatus::Failed;
        self.reason = Some(reason.into());
        Ok(())
    }
}

/// Criteria for listing payments. Every criterion that is set must match.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub job: Option<JobId>,
    pub employer: Option<UserId>,
    pub worker: Option<UserId>,
    pub r#type: Option<PaymentType>,
    pub status: Option<PaymentStatus>,
}

impl PaymentFilter {
    pub fn for_job(job: JobId) -> Self {
        Self {
            job: Some(job),
            ..Default::default()
        }
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        self.job.is_none_or(|job| payment.job_id == job)
            && self.employer.is_none_or(|employer| payment.employer_id == employer)
            && self.worker.is_none_or(|worker| payment.worker_id == worker)
            && self.r#type.is_none_or(|t| payment.r#type == t)
            && self.status.is_none_or(|status| payment.status == status)
    }
}
