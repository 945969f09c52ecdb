use std::fmt;

use serde::Serialize;

use super::domain::JobStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Update,
    Publish,
    Pause,
    Resume,
    Close,
    Renew,
    Expire,
    Sponsor,
}

impl JobAction {
    pub const fn label(self) -> &'static str {
        match self {
            JobAction::Update => "update",
            JobAction::Publish => "publish",
            JobAction::Pause => "pause",
            JobAction::Resume => "resume",
            JobAction::Close => "close",
            JobAction::Renew => "renew",
            JobAction::Expire => "expire",
            JobAction::Sponsor => "sponsor",
        }
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status a job moves to when `action` is applied, or `None` when the
/// action is not allowed from `from`.
pub fn next_status(from: JobStatus, action: JobAction) -> Option<JobStatus> {
    use JobAction as A;
    use JobStatus as S;

    match (from, action) {
        (S::Draft, A::Update) => Some(S::Draft),
        (S::Paused, A::Update) => Some(S::Paused),
        (S::Draft, A::Publish) => Some(S::Published),
        (S::Published, A::Pause) => Some(S::Paused),
        (S::Paused, A::Resume) => Some(S::Published),
        (S::Published | S::Paused, A::Close) => Some(S::Closed),
        (S::Expired, A::Renew) => Some(S::Published),
        (S::Published | S::Paused, A::Expire) => Some(S::Expired),
        (S::Published, A::Sponsor) => Some(S::Published),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [JobStatus; 5] = [
        JobStatus::Draft,
        JobStatus::Published,
        JobStatus::Paused,
        JobStatus::Closed,
        JobStatus::Expired,
    ];

    #[test]
    fn closed_jobs_accept_no_action() {
        for action in [
            JobAction::Update,
            JobAction::Publish,
            JobAction::Pause,
            JobAction::Resume,
            JobAction::Close,
            JobAction::Renew,
            JobAction::Expire,
            JobAction::Sponsor,
        ] {
            assert_eq!(next_status(JobStatus::Closed, action), None, "{action}");
        }
    }

    #[test]
    fn only_drafts_publish_and_only_expired_jobs_renew() {
        for status in ALL_STATUSES {
            assert_eq!(
                next_status(status, JobAction::Publish).is_some(),
                status == JobStatus::Draft
            );
            assert_eq!(
                next_status(status, JobAction::Renew).is_some(),
                status == JobStatus::Expired
            );
        }
    }

    #[test]
    fn pause_and_resume_are_inverse() {
        assert_eq!(
            next_status(JobStatus::Published, JobAction::Pause),
            Some(JobStatus::Paused)
        );
        assert_eq!(
            next_status(JobStatus::Paused, JobAction::Resume),
            Some(JobStatus::Published)
        );
        assert_eq!(next_status(JobStatus::Paused, JobAction::Sponsor), None);
    }
}
