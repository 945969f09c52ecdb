//! Wires repositories, services and routers into one application.

use std::sync::Arc;

use axum::{Extension, Router};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::accounts::{account_router, AccountService};
use crate::applications::{application_router, ApplicationService};
use crate::billing::{billing_router, BillingService, PaymentGateway};
use crate::clock::Clock;
use crate::config::{AuthConfig, MarketplaceConfig};
use crate::entities::{entity_router, EntityService};
use crate::http::SharedAuthenticator;
use crate::ids::JobId;
use crate::jobs::{job_router, JobError, JobService};
use crate::matching::{matching_router, CandidateSearchService};
use crate::messaging::{messaging_router, MessagingService};
use crate::notify::Notifier;
use crate::profiles::{profile_router, ProfileService};
use crate::store::memory::{
    InMemoryApplications, InMemoryBilling, InMemoryEntities, InMemoryJobs, InMemoryMessages,
    InMemoryProfiles, InMemoryUsers,
};

/// Outside-world adapters the services talk to.
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
}

/// Result of one maintenance sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub expired_jobs: Vec<JobId>,
    pub purged_codes: usize,
}

/// Every service of the job board, sharing one set of repositories.
#[derive(Clone)]
pub struct Platform {
    pub clock: Arc<dyn Clock>,
    pub accounts: Arc<AccountService>,
    pub entities: Arc<EntityService>,
    pub billing: Arc<BillingService>,
    pub jobs: Arc<JobService>,
    pub profiles: Arc<ProfileService>,
    pub search: Arc<CandidateSearchService>,
    pub applications: Arc<ApplicationService>,
    pub messaging: Arc<MessagingService>,
}

impl Platform {
    /// Build the platform on top of the in-memory repositories.
    pub fn in_memory(
        auth: &AuthConfig,
        marketplace: &MarketplaceConfig,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            notifier,
            gateway,
            clock,
        } = collaborators;

        let users = Arc::new(InMemoryUsers::default());
        let accounts = Arc::new(AccountService::new(
            users.clone(),
            notifier.clone(),
            clock.clone(),
            auth,
        ));
        let entities = Arc::new(EntityService::new(
            Arc::new(InMemoryEntities::default()),
            users,
            clock.clone(),
        ));
        let billing = Arc::new(BillingService::new(
            Arc::new(InMemoryBilling::default()),
            entities.clone(),
            gateway,
            clock.clone(),
            marketplace.sponsor_credits_per_day,
        ));
        let jobs = Arc::new(JobService::new(
            Arc::new(InMemoryJobs::default()),
            entities.clone(),
            billing.clone(),
            clock.clone(),
            marketplace.listing_days,
        ));
        let profiles = Arc::new(ProfileService::new(
            Arc::new(InMemoryProfiles::default()),
            accounts.clone(),
            clock.clone(),
        ));
        let search = Arc::new(CandidateSearchService::new(
            entities.clone(),
            billing.clone(),
            jobs.clone(),
            profiles.clone(),
            clock.clone(),
        ));
        let applications = Arc::new(ApplicationService::new(
            Arc::new(InMemoryApplications::default()),
            jobs.clone(),
            profiles.clone(),
            entities.clone(),
            accounts.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let messaging = Arc::new(MessagingService::new(
            Arc::new(InMemoryMessages::default()),
            accounts.clone(),
            notifier,
            clock.clone(),
        ));

        Self {
            clock,
            accounts,
            entities,
            billing,
            jobs,
            profiles,
            search,
            applications,
            messaging,
        }
    }

    /// All module routers behind one bearer-token authenticator.
    pub fn router(&self) -> Router {
        let authenticator: SharedAuthenticator = self.accounts.clone();
        Router::new()
            .merge(account_router(self.accounts.clone()))
            .merge(entity_router(self.entities.clone()))
            .merge(billing_router(self.billing.clone()))
            .merge(job_router(self.jobs.clone()))
            .merge(profile_router(self.profiles.clone()))
            .merge(matching_router(self.search.clone()))
            .merge(application_router(self.applications.clone()))
            .merge(messaging_router(self.messaging.clone()))
            .layer(Extension(authenticator))
    }

    /// Expire listings whose window has ended and drop stale one-time codes.
    pub fn run_maintenance(&self, today: NaiveDate) -> Result<MaintenanceReport, JobError> {
        let expired_jobs = self.jobs.expire_due(today)?;
        let purged_codes = self.accounts.purge_expired();
        if !expired_jobs.is_empty() || purged_codes > 0 {
            info!(
                expired = expired_jobs.len(),
                purged_codes, "maintenance sweep finished"
            );
        }
        Ok(MaintenanceReport {
            expired_jobs,
            purged_codes,
        })
    }
}
