use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{info, warn};

use super::filter::CandidateFilter;
use super::recommend::{recommend_jobs, JobRecommendation};
use super::search::{match_candidates_for_job, search_candidates, CandidateMatch};
use crate::accounts::{AuthenticatedUser, Role};
use crate::billing::{BillingError, BillingService};
use crate::clock::Clock;
use crate::entities::{EntityError, EntityService, MemberRole};
use crate::ids::{EntityId, JobId};
use crate::jobs::{JobError, JobService};
use crate::profiles::{ProfileError, ProfileService};

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("candidate search is not included in this entity's subscription")]
    SearchNotIncluded,
    #[error("only candidates receive job recommendations")]
    CandidatesOnly,
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl MatchingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MatchingError::SearchNotIncluded => StatusCode::PAYMENT_REQUIRED,
            MatchingError::CandidatesOnly => StatusCode::FORBIDDEN,
            MatchingError::Entity(err) => err.status_code(),
            MatchingError::Billing(err) => err.status_code(),
            MatchingError::Job(err) => err.status_code(),
            MatchingError::Profile(err) => err.status_code(),
        }
    }
}

/// Gatekeeper in front of the matching functions: membership and the
/// subscription feature for employers, profile ownership for candidates.
pub struct CandidateSearchService {
    entities: Arc<EntityService>,
    billing: Arc<BillingService>,
    jobs: Arc<JobService>,
    profiles: Arc<ProfileService>,
    clock: Arc<dyn Clock>,
}

impl CandidateSearchService {
    pub fn new(
        entities: Arc<EntityService>,
        billing: Arc<BillingService>,
        jobs: Arc<JobService>,
        profiles: Arc<ProfileService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entities,
            billing,
            jobs,
            profiles,
            clock,
        }
    }

    pub fn search(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateMatch>, MatchingError> {
        self.entities
            .require_role(actor, entity, MemberRole::Recruiter)?;
        let today = self.clock.today();
        self.require_search(entity)?;

        let matches = search_candidates(&self.profiles.searchable()?, filter, today);
        info!(entity_id = %entity, results = matches.len(), "candidate search");
        Ok(matches)
    }

    pub fn candidates_for_job(
        &self,
        actor: &AuthenticatedUser,
        job: &JobId,
    ) -> Result<Vec<CandidateMatch>, MatchingError> {
        let job = self.jobs.job_for_member(actor, job)?;
        self.require_search(&job.entity_id)?;

        let today = self.clock.today();
        let matches = match_candidates_for_job(&job, &self.profiles.searchable()?, today);
        info!(job_id = %job.id, results = matches.len(), "job candidate match");
        Ok(matches)
    }

    pub fn recommendations(
        &self,
        actor: &AuthenticatedUser,
    ) -> Result<Vec<JobRecommendation>, MatchingError> {
        if actor.role != Role::Candidate {
            return Err(MatchingError::CandidatesOnly);
        }
        let profile = self.profiles.mine(actor)?;
        let today = self.clock.today();
        Ok(recommend_jobs(&profile, &self.jobs.listed_jobs(today)?, today))
    }

    fn require_search(&self, entity: &EntityId) -> Result<(), MatchingError> {
        if self
            .billing
            .has_candidate_search(entity, self.clock.today())?
        {
            Ok(())
        } else {
            warn!(entity_id = %entity, "candidate search without subscription");
            Err(MatchingError::SearchNotIncluded)
        }
    }
}
