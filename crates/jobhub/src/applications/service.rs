use std::sync::Arc;

use axum::http::StatusCode;
use chrono::NaiveDate;
use tracing::{error, info, warn};

use super::domain::{Application, ApplicationStatus, StatusChange};
use super::repository::ApplicationRepository;
use crate::accounts::{AccountError, AccountService, AuthenticatedUser, Role};
use crate::clock::Clock;
use crate::entities::{EntityError, EntityService, MemberRole};
use crate::ids::{ApplicationId, JobId, UserId};
use crate::jobs::{JobError, JobService};
use crate::notify::{Notification, Notifier};
use crate::profiles::{ProfileError, ProfileService};
use crate::store::RepositoryError;

const MAX_COVER_LETTER_CHARS: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("only candidates can apply to jobs")]
    CandidatesOnly,
    #[error("create a job profile before applying")]
    ProfileRequired,
    #[error("cover letter exceeds 10000 characters")]
    CoverLetterTooLong,
    #[error("job is not accepting applications")]
    JobNotOpen,
    #[error("you have already applied to this job")]
    AlreadyApplied,
    #[error("cannot move an application from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("application not found")]
    NotFound,
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Profile(ProfileError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApplicationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApplicationError::CandidatesOnly => StatusCode::FORBIDDEN,
            ApplicationError::ProfileRequired | ApplicationError::CoverLetterTooLong => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApplicationError::JobNotOpen
            | ApplicationError::AlreadyApplied
            | ApplicationError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApplicationError::NotFound | ApplicationError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ApplicationError::Job(err) => err.status_code(),
            ApplicationError::Profile(err) => err.status_code(),
            ApplicationError::Entity(err) => err.status_code(),
            ApplicationError::Account(err) => err.status_code(),
            ApplicationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Service handling applications from submission to hire, rejection or
/// withdrawal.
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<JobService>,
    profiles: Arc<ProfileService>,
    entities: Arc<EntityService>,
    accounts: Arc<AccountService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<JobService>,
        profiles: Arc<ProfileService>,
        entities: Arc<EntityService>,
        accounts: Arc<AccountService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications,
            jobs,
            profiles,
            entities,
            accounts,
            notifier,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn apply(
        &self,
        actor: &AuthenticatedUser,
        job_id: &JobId,
        cover_letter: &str,
        today: NaiveDate,
    ) -> Result<Application, ApplicationError> {
        if actor.role != Role::Candidate {
            return Err(ApplicationError::CandidatesOnly);
        }
        let cover_letter = cover_letter.trim();
        if cover_letter.chars().count() > MAX_COVER_LETTER_CHARS {
            return Err(ApplicationError::CoverLetterTooLong);
        }
        match self.profiles.mine(actor) {
            Ok(_) => {}
            Err(ProfileError::NotFound) => return Err(ApplicationError::ProfileRequired),
            Err(err) => return Err(ApplicationError::Profile(err)),
        }

        let job = match self.jobs.find(job_id) {
            Ok(job) => job,
            Err(JobError::NotFound) => return Err(ApplicationError::JobNotOpen),
            Err(err) => return Err(err.into()),
        };
        if !job.is_listed(today) {
            return Err(ApplicationError::JobNotOpen);
        }

        let now = self.clock.now();
        let application = Application {
            id: ApplicationId::generate(),
            job_id: job.id,
            entity_id: job.entity_id,
            candidate_id: actor.user_id,
            cover_letter: cover_letter.to_string(),
            status: ApplicationStatus::Submitted,
            history: vec![StatusChange {
                status: ApplicationStatus::Submitted,
                at: now,
                by: actor.user_id,
            }],
            submitted_at: now,
            updated_at: now,
        };

        let application = match self.applications.insert(application) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => {
                warn!(job_id = %job.id, candidate = %actor.user_id, "duplicate application");
                return Err(ApplicationError::AlreadyApplied);
            }
            Err(err) => return Err(err.into()),
        };
        info!(application_id = %application.id, job_id = %job.id, "application submitted");

        for owner in self.entities.member_ids(&job.entity_id, MemberRole::Owner)? {
            self.notify_user(
                &owner,
                "application_received",
                format!("A new application was submitted for \"{}\".", job.title),
            );
        }
        Ok(application)
    }

    pub fn withdraw(
        &self,
        actor: &AuthenticatedUser,
        id: &ApplicationId,
    ) -> Result<Application, ApplicationError> {
        let mut application = self.fetch(id)?;
        if application.candidate_id != actor.user_id {
            return Err(ApplicationError::NotFound);
        }
        if application.status.is_final() {
            return Err(ApplicationError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Withdrawn,
            });
        }

        application.record(ApplicationStatus::Withdrawn, actor.user_id, self.clock.now());
        self.applications.update(application.clone())?;
        info!(application_id = %application.id, "application withdrawn");
        Ok(application)
    }

    /// Applications to one job, oldest first, for members of its entity.
    pub fn applications_for_job(
        &self,
        actor: &AuthenticatedUser,
        job_id: &JobId,
    ) -> Result<Vec<Application>, ApplicationError> {
        let job = self.jobs.job_for_member(actor, job_id)?;
        let mut applications = self.applications.by_job(&job.id)?;
        applications.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(applications)
    }

    pub fn mine(&self, actor: &AuthenticatedUser) -> Result<Vec<Application>, ApplicationError> {
        let mut applications = self.applications.by_candidate(&actor.user_id)?;
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(applications)
    }

    /// Visible to the applicant and to members of the hiring entity.
    pub fn get(
        &self,
        actor: &AuthenticatedUser,
        id: &ApplicationId,
    ) -> Result<Application, ApplicationError> {
        let application = self.fetch(id)?;
        if application.candidate_id == actor.user_id {
            return Ok(application);
        }
        match self
            .entities
            .require_role(actor, &application.entity_id, MemberRole::Recruiter)
        {
            Ok(_) => Ok(application),
            Err(_) => Err(ApplicationError::NotFound),
        }
    }

    pub fn advance(
        &self,
        actor: &AuthenticatedUser,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, ApplicationError> {
        let mut application = self.fetch(id)?;
        self.entities
            .require_role(actor, &application.entity_id, MemberRole::Recruiter)?;
        if !application.status.can_advance_to(status) {
            return Err(ApplicationError::InvalidTransition {
                from: application.status,
                to: status,
            });
        }

        application.record(status, actor.user_id, self.clock.now());
        self.applications.update(application.clone())?;
        info!(application_id = %application.id, status = status.label(), "application advanced");

        let title = self
            .jobs
            .find(&application.job_id)
            .map(|job| job.title)
            .unwrap_or_else(|_| "a job".to_string());
        self.notify_user(
            &application.candidate_id,
            "application_status",
            format!("Your application for \"{title}\" is now {}.", status.label()),
        );
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Application, ApplicationError> {
        self.applications
            .fetch(id)?
            .ok_or(ApplicationError::NotFound)
    }

    fn notify_user(&self, user: &UserId, template: &str, body: String) {
        let contact = match self.accounts.contact(user) {
            Ok(contact) => contact,
            Err(err) => {
                warn!(%err, user_id = %user, template, "no contact for notification");
                return;
            }
        };
        if let Err(err) = self
            .notifier
            .notify(Notification::email(contact.email, template, body))
        {
            error!(%err, user_id = %user, template, "failed to queue notification");
        }
    }
}
