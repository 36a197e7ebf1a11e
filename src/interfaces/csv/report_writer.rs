use crate::application::summary::{EmployerSummary, PlatformSummary, WorkerSummary};
use crate::domain::ids::{JobId, UserId};
use crate::domain::job::{Job, JobStatus};
use crate::domain::payment::{Payment, PaymentStatus, PaymentType};
use crate::domain::user::{Role, User};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct JobRow<'a> {
    job: JobId,
    title: &'a str,
    status: JobStatus,
    employer: UserId,
    worker: Option<UserId>,
    budget_min: Decimal,
    budget_max: Decimal,
    rating: Option<u8>,
}

#[derive(Debug, Serialize)]
struct PaymentRow {
    job: JobId,
    r#type: PaymentType,
    employer: UserId,
    worker: UserId,
    amount: Decimal,
    platform_fee: Decimal,
    total: Decimal,
    status: PaymentStatus,
}

/// One dashboard line per user. `amount` is spend for employers and
/// earnings for workers; admins leave the counters empty.
#[derive(Debug, Serialize)]
struct UserRow<'a> {
    user: UserId,
    name: &'a str,
    role: Role,
    jobs: Option<usize>,
    active: Option<usize>,
    completed: Option<usize>,
    amount: Option<Decimal>,
    average_rating: Option<Decimal>,
}

#[derive(Debug, Serialize)]
struct MetricRow<'a> {
    metric: &'a str,
    value: String,
}

/// Per-user dashboard numbers handed to [`ReportWriter::write_users`].
pub enum UserSummary {
    Employer(EmployerSummary),
    Worker(WorkerSummary),
    Admin,
}

const JOB_COLUMNS: [&str; 8] = [
    "job",
    "title",
    "status",
    "employer",
    "worker",
    "budget_min",
    "budget_max",
    "rating",
];
const PAYMENT_COLUMNS: [&str; 8] = [
    "job",
    "type",
    "employer",
    "worker",
    "amount",
    "platform_fee",
    "total",
    "status",
];
const USER_COLUMNS: [&str; 8] = [
    "user",
    "name",
    "role",
    "jobs",
    "active",
    "completed",
    "amount",
    "average_rating",
];
const METRIC_COLUMNS: [&str; 2] = ["metric", "value"];

/// Writes marketplace reports as CSV.
///
/// Every report starts with its column line, even when it has no rows.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(destination: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(destination);
        Self { writer }
    }

    pub fn write_jobs(&mut self, jobs: &[Job]) -> Result<()> {
        self.writer.write_record(JOB_COLUMNS)?;
        for job in jobs {
            self.writer.serialize(JobRow {
                job: job.id,
                title: &job.title,
                status: job.status,
                employer: job.employer_id,
                worker: job.worker_id,
                budget_min: job.budget.min.value().normalize(),
                budget_max: job.budget.max.value().normalize(),
                rating: job.rating,
            })?;
        }
        self.finish()
    }

    pub fn write_payments(&mut self, payments: &[Payment]) -> Result<()> {
        self.writer.write_record(PAYMENT_COLUMNS)?;
        for payment in payments {
            self.writer.serialize(PaymentRow {
                job: payment.job_id,
                r#type: payment.r#type,
                employer: payment.employer_id,
                worker: payment.worker_id,
                amount: payment.amount.value().normalize(),
                platform_fee: payment.platform_fee.value().normalize(),
                total: payment.total_amount.value().normalize(),
                status: payment.status,
            })?;
        }
        self.finish()
    }

    pub fn write_users(&mut self, users: &[(User, UserSummary)]) -> Result<()> {
        self.writer.write_record(USER_COLUMNS)?;
        for (user, summary) in users {
            let row = match summary {
                UserSummary::Employer(s) => UserRow {
                    jobs: Some(s.posted),
                    active: Some(s.active),
                    completed: Some(s.completed),
                    amount: Some(s.total_spent.value().normalize()),
                    ..UserRow::bare(user)
                },
                UserSummary::Worker(s) => UserRow {
                    jobs: Some(s.assigned),
                    active: Some(s.active),
                    completed: Some(s.completed),
                    amount: Some(s.total_earned.value().normalize()),
                    average_rating: s.average_rating.map(|r| r.normalize()),
                    ..UserRow::bare(user)
                },
                UserSummary::Admin => UserRow::bare(user),
            };
            self.writer.serialize(row)?;
        }
        self.finish()
    }

    /// Writes the platform totals as `metric,value` pairs.
    pub fn write_platform(&mut self, summary: &PlatformSummary) -> Result<()> {
        self.writer.write_record(METRIC_COLUMNS)?;
        self.writer.serialize(MetricRow {
            metric: "users",
            value: summary.users.to_string(),
        })?;
        for (status, count) in &summary.jobs_by_status {
            self.writer.serialize(MetricRow {
                metric: &format!("jobs_{}", status.to_string().replace('-', "_")),
                value: count.to_string(),
            })?;
        }
        for (metric, value) in [
            ("fees_collected", summary.fees_collected.to_string()),
            ("total_refunded", summary.total_refunded.to_string()),
            ("payments_in_flight", summary.payments_in_flight.to_string()),
        ] {
            self.writer.serialize(MetricRow { metric, value })?;
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<'a> UserRow<'a> {
    fn bare(user: &'a User) -> Self {
        Self {
            user: user.id,
            name: &user.name,
            role: user.role,
            jobs: None,
            active: None,
            completed: None,
            amount: None,
            average_rating: None,
        }
    }
}
