//! Fixtures shared by the module test suites: a fully wired platform on a
//! manual clock with a recording outbox and a sandbox payment gateway.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::accounts::{AuthenticatedUser, Role};
use crate::billing::SandboxGateway;
use crate::clock::{Clock, ManualClock};
use crate::config::{AuthConfig, MarketplaceConfig};
use crate::entities::{Entity, NewEntity};
use crate::ids::EntityId;
use crate::jobs::{EmploymentType, Job, JobDraft, JobRequirements, Workplace};
use crate::notify::RecordingNotifier;
use crate::platform::{Collaborators, Platform};
use crate::profiles::{Experience, JobProfile, ProfileDraft};

pub(crate) const PASSWORD: &str = "correct-horse-42";

pub(crate) struct World {
    pub(crate) platform: Platform,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) outbox: RecordingNotifier,
    pub(crate) gateway: Arc<SandboxGateway>,
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn world() -> World {
    let clock = Arc::new(ManualClock::at_date(date(2025, 5, 1)));
    let outbox = RecordingNotifier::default();
    let gateway = Arc::new(SandboxGateway::default());
    let platform = Platform::in_memory(
        &AuthConfig::default(),
        &MarketplaceConfig::default(),
        Collaborators {
            notifier: Arc::new(outbox.clone()),
            gateway: gateway.clone(),
            clock: clock.clone(),
        },
    );

    World {
        platform,
        clock,
        outbox,
        gateway,
    }
}

impl World {
    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub(crate) fn user(&self, email: &str, role: Role) -> AuthenticatedUser {
        let view = self
            .platform
            .accounts
            .provision(email, "Test Person", PASSWORD, role)
            .expect("provisions");
        AuthenticatedUser {
            user_id: view.id,
            role: view.role,
        }
    }

    pub(crate) fn candidate(&self, email: &str) -> AuthenticatedUser {
        self.user(email, Role::Candidate)
    }

    pub(crate) fn employer(&self, email: &str) -> AuthenticatedUser {
        self.user(email, Role::Employer)
    }

    pub(crate) fn token(&self, email: &str) -> String {
        self.platform
            .accounts
            .login(email, PASSWORD)
            .expect("logs in")
            .token
    }

    pub(crate) fn entity(&self, owner: &AuthenticatedUser, name: &str) -> Entity {
        self.platform
            .entities
            .create(
                owner,
                NewEntity {
                    name: name.to_string(),
                    ..NewEntity::default()
                },
            )
            .expect("creates entity")
    }

    pub(crate) fn buy(&self, owner: &AuthenticatedUser, entity: &EntityId, plan: &str) {
        self.platform
            .billing
            .purchase(owner, entity, plan)
            .expect("purchase succeeds");
    }

    pub(crate) fn credits(&self, owner: &AuthenticatedUser, entity: &EntityId) -> u32 {
        self.platform
            .billing
            .wallet(owner, entity)
            .expect("wallet readable")
            .credits
    }

    /// An employer owning a company funded with the `growth-20` pack.
    pub(crate) fn funded_company(&self, email: &str, name: &str) -> (AuthenticatedUser, Entity) {
        let owner = self.employer(email);
        let entity = self.entity(&owner, name);
        self.buy(&owner, &entity.id, "growth-20");
        (owner, entity)
    }

    pub(crate) fn published_job(
        &self,
        owner: &AuthenticatedUser,
        entity: &EntityId,
        draft: JobDraft,
    ) -> Job {
        let job = self
            .platform
            .jobs
            .create_draft(owner, entity, draft)
            .expect("drafts");
        self.platform
            .jobs
            .publish(owner, &job.id, self.today())
            .expect("publishes")
    }

    pub(crate) fn profile(
        &self,
        candidate: &AuthenticatedUser,
        skills: &[&str],
        years: i32,
    ) -> JobProfile {
        let mut draft = profile_draft(skills);
        if years > 0 {
            let today = self.today();
            draft.experience.push(Experience {
                title: "Engineer".to_string(),
                company: "Previous Co".to_string(),
                start: date(today.year() - years, 1, 1),
                end: Some(date(today.year(), 1, 1)),
                description: String::new(),
            });
        }
        self.platform
            .profiles
            .upsert(candidate, draft)
            .expect("saves profile")
    }

    pub(crate) fn router(&self) -> Router {
        self.platform.router()
    }
}

pub(crate) fn job_draft(title: &str, skills: &[&str]) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: format!("{title} wanted"),
        location: "Berlin".to_string(),
        employment_type: EmploymentType::FullTime,
        workplace: Workplace::Hybrid,
        requirements: JobRequirements {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..JobRequirements::default()
        },
        salary: None,
    }
}

pub(crate) fn profile_draft(skills: &[&str]) -> ProfileDraft {
    ProfileDraft {
        headline: "Backend engineer".to_string(),
        location: "Berlin".to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        open_to_work: true,
        ..ProfileDraft::default()
    }
}

pub(crate) fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
