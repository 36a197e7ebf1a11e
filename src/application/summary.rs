//! Read-side aggregates rendered by the role dashboards.

use super::marketplace::Marketplace;
use crate::domain::ids::UserId;
use crate::domain::job::{JobFilter, JobStatus};
use crate::domain::money::Amount;
use crate::domain::payment::{PaymentFilter, PaymentStatus, PaymentType};
use crate::domain::user::Role;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployerSummary {
    pub employer: UserId,
    pub posted: usize,
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Completed job payments and tips, fees included.
    pub total_spent: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub worker: UserId,
    pub assigned: usize,
    pub active: usize,
    pub completed: usize,
    /// Completed job payment amounts plus tips.
    pub total_earned: Amount,
    pub average_rating: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSummary {
    pub users: usize,
    /// Job counts in `JobStatus::ALL` order.
    pub jobs_by_status: Vec<(JobStatus, usize)>,
    pub fees_collected: Amount,
    pub total_refunded: Amount,
    pub payments_in_flight: usize,
}

impl Marketplace {
    pub async fn employer_summary(&self, employer: UserId) -> Result<EmployerSummary> {
        self.user(employer).await?.require_role(Role::Employer)?;
        let jobs = self
            .jobs(&JobFilter {
                employer: Some(employer),
                ..Default::default()
            })
            .await?;
        let payments = self
            .payments(&PaymentFilter {
                employer: Some(employer),
                status: Some(PaymentStatus::Completed),
                ..Default::default()
            })
            .await?;

        Ok(EmployerSummary {
            employer,
            posted: jobs.len(),
            active: jobs.iter().filter(|job| job.is_active()).count(),
            completed: count_status(&jobs, JobStatus::Completed),
            cancelled: count_status(&jobs, JobStatus::Cancelled),
            total_spent: payments
                .iter()
                .filter(|p| p.r#type != PaymentType::Refund)
                .map(|p| p.total_amount)
                .sum(),
        })
    }

    pub async fn worker_summary(&self, worker: UserId) -> Result<WorkerSummary> {
        self.user(worker).await?.require_role(Role::Worker)?;
        let jobs = self
            .jobs(&JobFilter {
                worker: Some(worker),
                ..Default::default()
            })
            .await?;
        let payments = self
            .payments(&PaymentFilter {
                worker: Some(worker),
                status: Some(PaymentStatus::Completed),
                ..Default::default()
            })
            .await?;

        let ratings: Vec<Decimal> = jobs
            .iter()
            .filter_map(|job| job.rating)
            .map(Decimal::from)
            .collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            let sum: Decimal = ratings.iter().sum();
            Some((sum / Decimal::from(ratings.len())).round_dp(2))
        };

        Ok(WorkerSummary {
            worker,
            assigned: jobs.len(),
            active: jobs.iter().filter(|job| job.is_active()).count(),
            completed: count_status(&jobs, JobStatus::Completed),
            total_earned: payments
                .iter()
                .filter(|p| p.r#type != PaymentType::Refund)
                .map(|p| p.amount)
                .sum(),
            average_rating,
        })
    }

    /// Marketplace-wide totals for the admin dashboard.
    pub async fn platform_summary(&self) -> Result<PlatformSummary> {
        let users = self.users().await?;
        let jobs = self.jobs(&JobFilter::default()).await?;
        let payments = self.payments(&PaymentFilter::default()).await?;

        Ok(PlatformSummary {
            users: users.len(),
            jobs_by_status: JobStatus::ALL
                .into_iter()
                .map(|status| (status, count_status(&jobs, status)))
                .collect(),
            fees_collected: payments
                .iter()
                .filter(|p| {
                    p.r#type == PaymentType::JobPayment && p.status == PaymentStatus::Completed
                })
                .map(|p| p.platform_fee)
                .sum(),
            total_refunded: payments
                .iter()
                .filter(|p| p.r#type == PaymentType::Refund)
                .map(|p| p.total_amount)
                .sum(),
            payments_in_flight: payments
                .iter()
                .filter(|p| matches!(p.status, PaymentStatus::Pending | PaymentStatus::Processing))
                .count(),
        })
    }
}

fn count_status(jobs: &[crate::domain::job::Job], status: JobStatus) -> usize {
    jobs.iter().filter(|job| job.status == status).count()
}
