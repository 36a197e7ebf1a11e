use crate::application::marketplace::Marketplace;
use crate::domain::completion::{Rating, Review};
use crate::domain::ids::{JobId, UserId};
use crate::domain::job::{Budget, JobDraft, JobPatch};
use crate::domain::money::Amount;
use crate::domain::user::{Role, User};
use crate::error::{OddJobsError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Employer,
    Worker,
    Admin,
    Post,
    Update,
    Assign,
    Start,
    Done,
    Revise,
    Approve,
    Confirm,
    Fail,
    Retry,
    Refund,
    Cancel,
    Message,
}

/// One row of a command log: `type, actor, job, target, min, max, rating, tip, note`.
///
/// Which columns matter depends on `type`; the rest may be left empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub r#type: CommandType,
    pub actor: UserId,
    #[serde(default)]
    pub job: Option<JobId>,
    #[serde(default)]
    pub target: Option<UserId>,
    #[serde(default)]
    pub min: Option<Decimal>,
    #[serde(default)]
    pub max: Option<Decimal>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub tip: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
}

impl CommandRecord {
    /// Runs the command against `market`.
    pub async fn execute(self, market: &Marketplace) -> Result<()> {
        let actor = self.actor;
        match self.r#type {
            CommandType::Employer => self.register(market, Role::Employer).await,
            CommandType::Worker => self.register(market, Role::Worker).await,
            CommandType::Admin => self.register(market, Role::Admin).await,
            CommandType::Post => {
                let job = self.job()?;
                let min = amount(self.min, "min")?;
                let max = amount(self.max, "max")?;
                let budget = Budget::new(min, max, market.currency())?;
                let title = self.note.unwrap_or_default();
                market.create_job(actor, job, JobDraft::new(title, budget)).await?;
                Ok(())
            }
            CommandType::Update => {
                let job = self.job()?;
                let patch = JobPatch {
                    title: self.note,
                    budget_min: self.min.map(Amount::new).transpose()?,
                    budget_max: self.max.map(Amount::new).transpose()?,
                    ..Default::default()
                };
                market.update_job(actor, job, patch).await?;
                Ok(())
            }
            CommandType::Assign => {
                let job = self.job()?;
                let worker = self.target.ok_or_else(|| missing("target"))?;
                market.assign(actor, job, worker).await?;
                Ok(())
            }
            CommandType::Start => {
                market.start(actor, self.job()?).await?;
                Ok(())
            }
            CommandType::Done => {
                market.mark_worker_done(actor, self.job()?).await?;
                Ok(())
            }
            CommandType::Revise => {
                let job = self.job()?;
                let reason = self.note.unwrap_or_default();
                market.request_revision(actor, job, &reason).await?;
                Ok(())
            }
            CommandType::Approve => {
                let job = self.job()?;
                let rating = self.rating.ok_or_else(|| missing("rating"))?;
                let review = Review {
                    rating: Rating::new(rating)?,
                    comment: self.note.unwrap_or_default(),
                    tip: self.tip.map(Amount::new).transpose()?.unwrap_or(Amount::ZERO),
                };
                market.approve_work(actor, job, review).await?;
                Ok(())
            }
            CommandType::Confirm => {
                market.confirm_payment(actor, self.job()?).await?;
                Ok(())
            }
            CommandType::Fail => {
                let payment = market.job_payment(self.job()?).await?;
                let reason = self.note.unwrap_or_default();
                market.fail_payment(actor, payment.id, &reason).await?;
                Ok(())
            }
            CommandType::Retry => {
                let payment = market.job_payment(self.job()?).await?;
                market.retry_payment(actor, payment.id).await?;
                Ok(())
            }
            CommandType::Refund => {
                let payment = market.job_payment(self.job()?).await?;
                let reason = self.note.unwrap_or_default();
                market.refund_payment(actor, payment.id, &reason).await?;
                Ok(())
            }
            CommandType::Cancel => {
                let job = self.job()?;
                market.cancel(actor, job, self.note.unwrap_or_default()).await?;
                Ok(())
            }
            CommandType::Message => {
                let recipient = self.target.ok_or_else(|| missing("target"))?;
                let content = self.note.unwrap_or_default();
                market.send_message(actor, recipient, self.job, &content).await?;
                Ok(())
            }
        }
    }

    async fn register(self, market: &Marketplace, role: Role) -> Result<()> {
        let name = self.note.unwrap_or_default();
        market.register_user(User::new(self.actor, name, role)?).await
    }

    fn job(&self) -> Result<JobId> {
        self.job.ok_or_else(|| missing("job"))
    }
}

fn amount(value: Option<Decimal>, column: &str) -> Result<Amount> {
    Amount::new(value.ok_or_else(|| missing(column))?)
}

fn missing(column: &str) -> OddJobsError {
    OddJobsError::ValidationError(format!("Missing `{column}` column"))
}
