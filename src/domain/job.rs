use super::ids::{JobId, UserId};
use super::money::{Amount, DEFAULT_CURRENCY};
use crate::error::{OddJobsError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Posted,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Statuses in lifecycle order.
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Posted,
        JobStatus::Assigned,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Posted => "posted",
            JobStatus::Assigned => "assigned",
            JobStatus::InProgress => "in-progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Price range an employer is willing to pay.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Budget {
    pub min: Amount,
    pub max: Amount,
    pub currency: String,
}

impl Budget {
    /// Builds a budget, rejecting ranges where `max < min`.
    pub fn new(min: Amount, max: Amount, currency: impl Into<String>) -> Result<Self> {
        let budget = Self {
            min,
            max,
            currency: currency.into(),
        };
        budget.validate()?;
        Ok(budget)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max < self.min {
            return Err(OddJobsError::ValidationError(format!(
                "Budget max {} is below min {}",
                self.max, self.min
            )));
        }
        Ok(())
    }

    /// Whether this budget overlaps the inclusive range `[low, high]`.
    pub fn overlaps(&self, low: Option<Amount>, high: Option<Amount>) -> bool {
        low.is_none_or(|low| self.max >= low) && high.is_none_or(|high| self.min <= high)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct JobDuration {
    /// Free-form estimate such as "2 hours" or "half day".
    pub estimated: String,
    pub flexible: bool,
}

/// A unit of work posted by an employer.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub budget: Budget,
    pub duration: JobDuration,
    pub requirements: Vec<String>,
    pub status: JobStatus,
    pub employer_id: UserId,
    pub worker_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub rating: Option<u8>,
    pub cancellation_reason: Option<String>,
    /// Incremented by the store on every successful write.
    pub version: u64,
}

/// Fields an employer supplies when posting a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub budget: Budget,
    pub duration: JobDuration,
    pub requirements: Vec<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl JobDraft {
    pub fn new(title: impl Into<String>, budget: Budget) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: "general".to_string(),
            location: String::new(),
            budget,
            duration: JobDuration::default(),
            requirements: Vec::new(),
            scheduled_for: None,
        }
    }
}

/// Partial update of a job. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub budget_min: Option<Amount>,
    pub budget_max: Option<Amount>,
    pub duration: Option<JobDuration>,
    pub requirements: Option<Vec<String>>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl JobPatch {
    pub fn touches_budget(&self) -> bool {
        self.budget_min.is_some() || self.budget_max.is_some()
    }
}

impl Job {
    pub fn new(id: JobId, employer_id: UserId, draft: JobDraft) -> Result<Self> {
        validate_title(&draft.title)?;
        draft.budget.validate()?;
        let now = Utc::now();
        Ok(Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            location: draft.location,
            budget: draft.budget,
            duration: draft.duration,
            requirements: draft.requirements,
            status: JobStatus::Posted,
            employer_id,
            worker_id: None,
            created_at: now,
            updated_at: now,
            scheduled_for: draft.scheduled_for,
            completed_at: None,
            rating: None,
            cancellation_reason: None,
            version: 0,
        })
    }

    /// Applies `patch`, leaving `self` untouched if the result would be invalid.
    pub fn apply_patch(&mut self, patch: JobPatch) -> Result<()> {
        if self.status.is_terminal() {
            return Err(OddJobsError::ValidationError(format!(
                "Job {} is {} and can no longer be edited",
                self.id, self.status
            )));
        }
        if patch.touches_budget() && self.status != JobStatus::Posted {
            return Err(OddJobsError::ValidationError(format!(
                "Budget of job {} is fixed once a worker is assigned",
                self.id
            )));
        }

        let mut updated = self.clone();
        if let Some(title) = patch.title {
            validate_title(&title)?;
            updated.title = title;
        }
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(category) = patch.category {
            updated.category = category;
        }
        if let Some(location) = patch.location {
            updated.location = location;
        }
        if let Some(min) = patch.budget_min {
            updated.budget.min = min;
        }
        if let Some(max) = patch.budget_max {
            updated.budget.max = max;
        }
        if let Some(duration) = patch.duration {
            updated.duration = duration;
        }
        if let Some(requirements) = patch.requirements {
            updated.requirements = requirements;
        }
        if let Some(scheduled_for) = patch.scheduled_for {
            updated.scheduled_for = Some(scheduled_for);
        }
        updated.budget.validate()?;
        updated.updated_at = Utc::now();

        *self = updated;
        Ok(())
    }

    /// The amount the worker is paid for this job.
    pub fn payable_amount(&self) -> Amount {
        self.budget.max
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Assigned | JobStatus::InProgress)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(OddJobsError::ValidationError(
            "Job title must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Criteria for listing jobs. Every criterion that is set must match.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub category: Option<String>,
    pub employer: Option<UserId>,
    pub worker: Option<UserId>,
    pub location: Option<String>,
    pub min_budget: Option<Amount>,
    pub max_budget: Option<Amount>,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.status.is_none_or(|status| job.status == status)
            && self
                .category
                .as_deref()
                .is_none_or(|category| job.category.eq_ignore_ascii_case(category))
            && self.employer.is_none_or(|employer| job.employer_id == employer)
            && self.worker.is_none_or(|worker| job.worker_id == Some(worker))
            && self
                .location
                .as_deref()
                .is_none_or(|location| contains_ignore_case(&job.location, location))
            && job.budget.overlaps(self.min_budget, self.max_budget)
            && self.search.as_deref().is_none_or(|term| {
                contains_ignore_case(&job.title, term)
                    || contains_ignore_case(&job.description, term)
            })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            min: Amount::ZERO,
            max: Amount::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}
