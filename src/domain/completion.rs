use super::ids::{JobId, UserId};
use super::money::Amount;
use crate::error::{OddJobsError, Result};
use serde::{Deserialize, Serialize};

/// A star rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(OddJobsError::ValidationError(format!(
                "Rating must be between 1 and 5, got {value}"
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = OddJobsError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// What the employer hands over when approving finished work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub rating: Rating,
    pub comment: String,
    pub tip: Amount,
}

/// State of the worker-confirm / employer-approve handshake for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCompletion {
    pub job_id: JobId,
    pub worker_id: UserId,
    pub employer_id: UserId,
    pub worker_confirmed: bool,
    pub employer_confirmed: bool,
    pub payment_triggered: bool,
    pub review: Option<Review>,
    pub revision_count: u32,
}

impl JobCompletion {
    pub fn new(job_id: JobId, employer_id: UserId, worker_id: UserId) -> Self {
        Self {
            job_id,
            worker_id,
            employer_id,
            worker_confirmed: false,
            employer_confirmed: false,
            payment_triggered: false,
            review: None,
            revision_count: 0,
        }
    }

    pub fn rating(&self) -> Option<Rating> {
        self.review.as_ref().map(|review| review.rating)
    }

    pub fn confirm_by_worker(&mut self) {
        self.worker_confirmed = true;
    }

    pub fn request_revision(&mut self) {
        self.worker_confirmed = false;
        self.revision_count += 1;
    }

    /// Records the employer's approval. Payment is only triggered once both
    /// sides have confirmed.
    pub fn approve(&mut self, review: Review) -> Result<()> {
        if !self.worker_confirmed {
            return Err(OddJobsError::WorkNotSubmitted(self.job_id));
        }
        self.employer_confirmed = true;
        self.review = Some(review);
        self.payment_triggered = self.worker_confirmed && self.employer_confirmed;
        Ok(())
    }
}
