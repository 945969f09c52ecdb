use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::StatusCode;
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use super::domain::{Job, JobDraft, JobStatus, Sponsorship};
use super::import::{parse_drafts, ImportError, RowError};
use super::lifecycle::{next_status, JobAction};
use super::query::{JobQuery, Page};
use super::repository::JobRepository;
use crate::accounts::AuthenticatedUser;
use crate::billing::{BillingError, BillingService};
use crate::clock::Clock;
use crate::entities::{EntityError, EntityService, MemberRole};
use crate::ids::{EntityId, JobId};
use crate::skills::normalize_skills;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job title must not be empty")]
    MissingTitle,
    #[error("salary minimum {min} exceeds maximum {max}")]
    InvalidSalary { min: u32, max: u32 },
    #[error("sponsorship must last at least one day")]
    InvalidSponsorshipDays,
    #[error("page must be at least 1 and per_page between 1 and 100")]
    InvalidPage,
    #[error("cannot {action} a {} job", .from.label())]
    InvalidTransition { from: JobStatus, action: JobAction },
    #[error("listing window ended on {0}; renew the job instead")]
    ListingExpired(NaiveDate),
    #[error("sponsorship would end on {ends_on}, after the listing expires on {expires_on}")]
    SponsorshipBeyondExpiry {
        ends_on: NaiveDate,
        expires_on: NaiveDate,
    },
    #[error("job not found")]
    NotFound,
    #[error("{0}")]
    Import(#[from] ImportError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::MissingTitle
            | JobError::InvalidSalary { .. }
            | JobError::InvalidSponsorshipDays
            | JobError::InvalidPage
            | JobError::SponsorshipBeyondExpiry { .. }
            | JobError::Import(_) => StatusCode::UNPROCESSABLE_ENTITY,
            JobError::InvalidTransition { .. } | JobError::ListingExpired(_) => {
                StatusCode::CONFLICT
            }
            JobError::NotFound | JobError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            JobError::Entity(err) => err.status_code(),
            JobError::Billing(err) => err.status_code(),
            JobError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Service driving job postings through their lifecycle.
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    entities: Arc<EntityService>,
    billing: Arc<BillingService>,
    clock: Arc<dyn Clock>,
    listing_days: u32,
    /// Held from loading a job until its new state is stored.
    write_guard: Mutex<()>,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        entities: Arc<EntityService>,
        billing: Arc<BillingService>,
        clock: Arc<dyn Clock>,
        listing_days: u32,
    ) -> Self {
        Self {
            jobs,
            entities,
            billing,
            clock,
            listing_days,
            write_guard: Mutex::new(()),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn create_draft(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
        draft: JobDraft,
    ) -> Result<Job, JobError> {
        self.entities
            .require_role(actor, entity, MemberRole::Recruiter)?;
        let job = self.build_job(actor, entity, draft)?;
        let job = self.jobs.insert(job)?;
        info!(job_id = %job.id, entity_id = %entity, "job drafted");
        Ok(job)
    }

    /// Replace the editable fields of a draft or paused job.
    pub fn update(
        &self,
        actor: &AuthenticatedUser,
        id: &JobId,
        draft: JobDraft,
    ) -> Result<Job, JobError> {
        let _guard = self.guard();
        let mut job = self.job_for_member(actor, id)?;
        transition(&job, JobAction::Update)?;
        let draft = validate_draft(draft)?;

        job.title = draft.title;
        job.description = draft.description;
        job.location = draft.location;
        job.employment_type = draft.employment_type;
        job.workplace = draft.workplace;
        job.requirements = draft.requirements;
        job.salary = draft.salary;
        job.updated_at = self.clock.now();

        self.jobs.update(job.clone())?;
        info!(job_id = %job.id, "job updated");
        Ok(job)
    }

    pub fn publish(
        &self,
        actor: &AuthenticatedUser,
        id: &JobId,
        today: NaiveDate,
    ) -> Result<Job, JobError> {
        let _guard = self.guard();
        let job = self.job_for_member(actor, id)?;
        let status = transition(&job, JobAction::Publish)?;
        let job = self.open_listing(job, status, today)?;
        info!(job_id = %job.id, expires_on = ?job.expires_on, "job published");
        Ok(job)
    }

    pub fn pause(&self, actor: &AuthenticatedUser, id: &JobId) -> Result<Job, JobError> {
        let _guard = self.guard();
        let mut job = self.job_for_member(actor, id)?;
        job.status = transition(&job, JobAction::Pause)?;
        job.updated_at = self.clock.now();
        self.jobs.update(job.clone())?;
        info!(job_id = %job.id, "job paused");
        Ok(job)
    }

    /// Put a paused job back on the listing, as long as its window is still open.
    pub fn resume(
        &self,
        actor: &AuthenticatedUser,
        id: &JobId,
        today: NaiveDate,
    ) -> Result<Job, JobError> {
        let _guard = self.guard();
        let mut job = self.job_for_member(actor, id)?;
        let status = transition(&job, JobAction::Resume)?;
        if let Some(expires_on) = job.expires_on {
            if expires_on <= today {
                return Err(JobError::ListingExpired(expires_on));
            }
        }

        job.status = status;
        job.updated_at = self.clock.now();
        self.jobs.update(job.clone())?;
        info!(job_id = %job.id, "job resumed");
        Ok(job)
    }

    /// Close a job for good. A running sponsorship stops after today and the
    /// remaining whole days are refunded.
    pub fn close(
        &self,
        actor: &AuthenticatedUser,
        id: &JobId,
        today: NaiveDate,
    ) -> Result<Job, JobError> {
        let _guard = self.guard();
        let mut job = self.job_for_member(actor, id)?;
        job.status = transition(&job, JobAction::Close)?;

        let per_day = self.billing.sponsor_credits_per_day();
        let mut refund = 0;
        if let Some(sponsorship) = job.sponsorship.as_mut() {
            let cut = (today + Duration::days(1)).max(sponsorship.starts_on);
            if cut < sponsorship.ends_on {
                let unused_days = (sponsorship.ends_on - cut).num_days();
                let unused_credits = u32::try_from(unused_days)
                    .unwrap_or(u32::MAX)
                    .saturating_mul(per_day)
                    .min(sponsorship.credits);
                sponsorship.ends_on = cut;
                sponsorship.credits -= unused_credits;
                refund = unused_credits;
            }
        }

        job.updated_at = self.clock.now();
        self.jobs.update(job.clone())?;
        if refund > 0 {
            let reason = format!("sponsorship of job {} cut short", job.id);
            self.billing
                .refund_credits(&job.entity_id, refund, &reason)?;
        }

        info!(job_id = %job.id, refunded_credits = refund, "job closed");
        Ok(job)
    }

    /// Relist an expired job with a fresh charge and listing window.
    pub fn renew(
        &self,
        actor: &AuthenticatedUser,
        id: &JobId,
        today: NaiveDate,
    ) -> Result<Job, JobError> {
        let _guard = self.guard();
        let mut job = self.job_for_member(actor, id)?;
        let status = transition(&job, JobAction::Renew)?;
        job.sponsorship = None;
        let job = self.open_listing(job, status, today)?;
        info!(job_id = %job.id, expires_on = ?job.expires_on, "job renewed");
        Ok(job)
    }

    /// Move every published or paused job whose window has ended to `Expired`.
    pub fn expire_due(&self, today: NaiveDate) -> Result<Vec<JobId>, JobError> {
        let _guard = self.guard();
        let now = self.clock.now();
        let mut expired = Vec::new();

        for mut job in self
            .jobs
            .by_status(&[JobStatus::Published, JobStatus::Paused])?
        {
            let due = job.expires_on.is_some_and(|end| end <= today);
            if !due {
                continue;
            }
            if let Some(status) = next_status(job.status, JobAction::Expire) {
                job.status = status;
                job.updated_at = now;
                self.jobs.update(job.clone())?;
                expired.push(job.id);
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), %today, "jobs expired");
        }
        Ok(expired)
    }

    pub fn sponsor(
        &self,
        actor: &AuthenticatedUser,
        id: &JobId,
        days: u32,
        today: NaiveDate,
    ) -> Result<Job, JobError> {
        let _guard = self.guard();
        let mut job = self.job_for_member(actor, id)?;
        transition(&job, JobAction::Sponsor)?;
        if days == 0 {
            return Err(JobError::InvalidSponsorshipDays);
        }

        let extension = Duration::days(i64::from(days));
        let (starts_on, ends_on, previous_credits) = match &job.sponsorship {
            Some(current) if current.is_active(today) => (
                current.starts_on,
                current.ends_on + extension,
                current.credits,
            ),
            _ => (today, today + extension, 0),
        };

        if let Some(expires_on) = job.expires_on {
            if ends_on > expires_on {
                warn!(job_id = %job.id, %ends_on, %expires_on, "sponsorship beyond listing window");
                return Err(JobError::SponsorshipBeyondExpiry {
                    ends_on,
                    expires_on,
                });
            }
        }

        let credits = self.billing.charge_sponsorship(&job.entity_id, days)?;
        job.sponsorship = Some(Sponsorship {
            starts_on,
            ends_on,
            credits: previous_credits + credits,
        });
        job.updated_at = self.clock.now();

        if let Err(err) = self.jobs.update(job.clone()) {
            self.billing
                .refund_credits(&job.entity_id, credits, "sponsorship rolled back")?;
            return Err(err.into());
        }

        info!(job_id = %job.id, days, credits, %ends_on, "job sponsored");
        Ok(job)
    }

    pub fn public_listing(&self, query: &JobQuery, today: NaiveDate) -> Result<Page<Job>, JobError> {
        if !query.has_valid_paging() {
            return Err(JobError::InvalidPage);
        }
        let jobs = self.jobs.by_status(&[JobStatus::Published])?;
        Ok(query.apply(jobs, today))
    }

    /// Every job of an entity regardless of status, newest first.
    pub fn jobs_for_entity(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
    ) -> Result<Vec<Job>, JobError> {
        self.entities
            .require_role(actor, entity, MemberRole::Recruiter)?;
        let mut jobs = self.jobs.by_entity(entity)?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    /// Listed jobs are public; anything else only to members of the entity.
    pub fn view(
        &self,
        viewer: Option<&AuthenticatedUser>,
        id: &JobId,
        today: NaiveDate,
    ) -> Result<Job, JobError> {
        let job = self.find(id)?;
        if job.is_listed(today) {
            return Ok(job);
        }
        match viewer {
            Some(actor)
                if self
                    .entities
                    .require_role(actor, &job.entity_id, MemberRole::Recruiter)
                    .is_ok() =>
            {
                Ok(job)
            }
            _ => Err(JobError::NotFound),
        }
    }

    /// Create drafts from CSV. Nothing is stored unless every row is valid.
    pub fn import_csv<R: Read>(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
        reader: R,
    ) -> Result<Vec<Job>, JobError> {
        self.entities
            .require_role(actor, entity, MemberRole::Recruiter)?;

        let upload = parse_drafts(reader)?;
        let mut jobs = Vec::new();
        let mut errors = upload.errors;
        for (line, draft) in upload.drafts {
            match self.build_job(actor, entity, draft) {
                Ok(job) => jobs.push(job),
                Err(err) => errors.push(RowError {
                    line,
                    message: err.to_string(),
                }),
            }
        }

        if !errors.is_empty() {
            errors.sort_by_key(|row| row.line);
            warn!(entity_id = %entity, rejected = errors.len(), "job import rejected");
            return Err(ImportError::Rows(errors).into());
        }

        self.jobs.insert_many(jobs.clone())?;
        info!(entity_id = %entity, imported = jobs.len(), "jobs imported");
        Ok(jobs)
    }

    pub fn find(&self, id: &JobId) -> Result<Job, JobError> {
        self.jobs.fetch(id)?.ok_or(JobError::NotFound)
    }

    pub fn listed_jobs(&self, today: NaiveDate) -> Result<Vec<Job>, JobError> {
        Ok(self
            .jobs
            .by_status(&[JobStatus::Published])?
            .into_iter()
            .filter(|job| job.is_listed(today))
            .collect())
    }

    /// Load a job and check the actor is a member of its entity.
    pub fn job_for_member(&self, actor: &AuthenticatedUser, id: &JobId) -> Result<Job, JobError> {
        let job = self.find(id)?;
        self.entities
            .require_role(actor, &job.entity_id, MemberRole::Recruiter)?;
        Ok(job)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn build_job(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
        draft: JobDraft,
    ) -> Result<Job, JobError> {
        let draft = validate_draft(draft)?;
        let now = self.clock.now();
        Ok(Job {
            id: JobId::generate(),
            entity_id: *entity,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            employment_type: draft.employment_type,
            workplace: draft.workplace,
            requirements: draft.requirements,
            salary: draft.salary,
            status: JobStatus::Draft,
            published_on: None,
            expires_on: None,
            sponsorship: None,
            publication_charge: None,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Charge for a publication and open a fresh listing window.
    fn open_listing(&self, mut job: Job, status: JobStatus, today: NaiveDate) -> Result<Job, JobError> {
        let receipt = self.billing.charge_publication(&job.entity_id, today)?;

        job.status = status;
        job.published_on = Some(today);
        job.expires_on = Some(today + Duration::days(i64::from(self.listing_days)));
        job.publication_charge = Some(receipt.clone());
        job.updated_at = self.clock.now();

        if let Err(err) = self.jobs.update(job.clone()) {
            self.billing.refund_publication(&job.entity_id, &receipt)?;
            return Err(err.into());
        }
        Ok(job)
    }
}

fn transition(job: &Job, action: JobAction) -> Result<JobStatus, JobError> {
    next_status(job.status, action).ok_or(JobError::InvalidTransition {
        from: job.status,
        action,
    })
}

fn validate_draft(mut draft: JobDraft) -> Result<JobDraft, JobError> {
    draft.title = draft.title.trim().to_string();
    if draft.title.is_empty() {
        return Err(JobError::MissingTitle);
    }
    draft.description = draft.description.trim().to_string();
    draft.location = draft.location.trim().to_string();

    if let Some(salary) = draft.salary.as_mut() {
        if salary.min > salary.max {
            return Err(JobError::InvalidSalary {
                min: salary.min,
                max: salary.max,
            });
        }
        salary.currency = salary.currency.trim().to_ascii_uppercase();
    }

    let requirements = &mut draft.requirements;
    requirements.skills = normalize_skills(&requirements.skills);
    requirements.preferred_skills = normalize_skills(&requirements.preferred_skills)
        .into_iter()
        .filter(|skill| !requirements.skills.contains(skill))
        .collect();

    Ok(draft)
}
