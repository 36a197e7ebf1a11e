//! The job status state machine.
//!
//! Every status change goes through [`next_status`], so out-of-order calls
//! are rejected in one place instead of being hidden behind UI conditionals.
//!
//! ```text
//! posted --assign--> assigned --start--> in-progress --approve--> completed
//!    |                  |                   |  ^
//!    |                  |                   |  | submit-work / request-revision
//!    +------cancel------+-------cancel------+--+--> cancelled
//! ```

use super::ids::JobId;
use super::job::JobStatus;
use crate::error::{OddJobsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum JobAction {
    Assign,
    Start,
    SubmitWork,
    RequestRevision,
    Approve,
    Cancel,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobAction::Assign => "assign",
            JobAction::Start => "start",
            JobAction::SubmitWork => "submit work",
            JobAction::RequestRevision => "request revision",
            JobAction::Approve => "approve",
            JobAction::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Returns the status a job moves to when `action` is applied in `from`.
///
/// `work_submitted` is the worker's confirmation flag from the completion
/// handshake; review actions are only valid once it is set, and the worker
/// may not submit twice without a revision request in between.
pub fn next_status(
    job: JobId,
    from: JobStatus,
    action: JobAction,
    work_submitted: bool,
) -> Result<JobStatus> {
    let next = match (from, action) {
        (JobStatus::Posted, JobAction::Assign) => JobStatus::Assigned,
        (JobStatus::Assigned, JobAction::Start) => JobStatus::InProgress,
        (JobStatus::InProgress, JobAction::SubmitWork) => {
            if work_submitted {
                return Err(OddJobsError::WorkAlreadySubmitted(job));
            }
            JobStatus::InProgress
        }
        (JobStatus::InProgress, JobAction::RequestRevision | JobAction::Approve) => {
            if !work_submitted {
                return Err(OddJobsError::WorkNotSubmitted(job));
            }
            match action {
                JobAction::Approve => JobStatus::Completed,
                _ => JobStatus::InProgress,
            }
        }
        (
            JobStatus::Posted | JobStatus::Assigned | JobStatus::InProgress,
            JobAction::Cancel,
        ) => JobStatus::Cancelled,
        _ => return Err(OddJobsError::InvalidTransition { job, from, action }),
    };
    Ok(next)
}
