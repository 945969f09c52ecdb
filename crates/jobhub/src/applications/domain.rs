use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ApplicationId, EntityId, JobId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Reviewing,
    Shortlisted,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub const fn is_final(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// The pipeline step that follows this one, if any.
    pub const fn next(self) -> Option<ApplicationStatus> {
        match self {
            ApplicationStatus::Submitted => Some(ApplicationStatus::Reviewing),
            ApplicationStatus::Reviewing => Some(ApplicationStatus::Shortlisted),
            ApplicationStatus::Shortlisted => Some(ApplicationStatus::Offered),
            ApplicationStatus::Offered => Some(ApplicationStatus::Hired),
            ApplicationStatus::Hired
            | ApplicationStatus::Rejected
            | ApplicationStatus::Withdrawn => None,
        }
    }

    /// Employers move an application one step forward or reject it while it
    /// is still open. Withdrawal belongs to the candidate.
    pub fn can_advance_to(self, target: ApplicationStatus) -> bool {
        if self.is_final() {
            return false;
        }
        target == ApplicationStatus::Rejected || self.next() == Some(target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    pub at: DateTime<Utc>,
    pub by: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub entity_id: EntityId,
    pub candidate_id: UserId,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub history: Vec<StatusChange>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub(crate) fn record(&mut self, status: ApplicationStatus, by: UserId, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
        self.history.push(StatusChange { status, at, by });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn pipeline_moves_one_step_at_a_time() {
        assert!(Submitted.can_advance_to(Reviewing));
        assert!(Reviewing.can_advance_to(Shortlisted));
        assert!(Offered.can_advance_to(Hired));
        assert!(!Submitted.can_advance_to(Shortlisted));
        assert!(!Reviewing.can_advance_to(Submitted));
    }

    #[test]
    fn open_applications_can_always_be_rejected() {
        for status in [Submitted, Reviewing, Shortlisted, Offered] {
            assert!(status.can_advance_to(Rejected), "{}", status.label());
        }
    }

    #[test]
    fn final_statuses_are_terminal() {
        for status in [Hired, Rejected, Withdrawn] {
            assert!(status.is_final());
            assert!(!status.can_advance_to(Rejected));
            assert_eq!(status.next(), None);
        }
        assert!(!Submitted.can_advance_to(Withdrawn));
    }
}
