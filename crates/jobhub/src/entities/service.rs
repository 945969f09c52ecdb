use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{slugify, Entity, EntityUpdate, MemberRole, Membership, NewEntity};
use super::repository::EntityRepository;
use crate::accounts::{AuthenticatedUser, Role, UserRepository};
use crate::clock::Clock;
use crate::ids::{EntityId, UserId};
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("entity name must not be empty")]
    MissingName,
    #[error("entity name must contain at least one letter or digit")]
    InvalidSlug,
    #[error("an entity with slug `{0}` already exists")]
    DuplicateSlug(String),
    #[error("only employer accounts can {0}")]
    EmployerOnly(&'static str),
    #[error("user is not an employer account")]
    NotAnEmployer,
    #[error("entity not found")]
    NotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("user is already a member of this entity")]
    AlreadyMember,
    #[error("user is not a member of this entity")]
    MemberNotFound,
    #[error("operation requires the {0} role in this entity")]
    InsufficientRole(&'static str),
    #[error("the last owner cannot be removed")]
    LastOwner,
    #[error("operation requires the admin role")]
    AdminOnly,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::MissingName | EntityError::InvalidSlug | EntityError::NotAnEmployer => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            EntityError::DuplicateSlug(_) | EntityError::AlreadyMember | EntityError::LastOwner => {
                StatusCode::CONFLICT
            }
            EntityError::EmployerOnly(_)
            | EntityError::InsufficientRole(_)
            | EntityError::AdminOnly => StatusCode::FORBIDDEN,
            EntityError::NotFound | EntityError::UserNotFound | EntityError::MemberNotFound => {
                StatusCode::NOT_FOUND
            }
            EntityError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            EntityError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            EntityError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// An entity together with the caller's role in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipView {
    pub entity: Entity,
    pub role: MemberRole,
}

/// Service managing entities and who may act on their behalf.
pub struct EntityService {
    entities: Arc<dyn EntityRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    /// Held while a roster change checks and stores memberships.
    roster_guard: Mutex<()>,
}

impl EntityService {
    pub fn new(
        entities: Arc<dyn EntityRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            entities,
            users,
            clock,
            roster_guard: Mutex::new(()),
        }
    }

    pub fn create(&self, actor: &AuthenticatedUser, new: NewEntity) -> Result<Entity, EntityError> {
        if actor.role != Role::Employer {
            return Err(EntityError::EmployerOnly("create entities"));
        }

        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(EntityError::MissingName);
        }
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(EntityError::InvalidSlug);
        }
        if self.entities.find_by_slug(&slug)?.is_some() {
            return Err(EntityError::DuplicateSlug(slug));
        }

        let now = self.clock.now();
        let entity = Entity {
            id: EntityId::generate(),
            name,
            slug: slug.clone(),
            website: trimmed(new.website),
            description: new.description.trim().to_string(),
            industry: trimmed(new.industry),
            headcount: new.headcount,
            verified: false,
            created_by: actor.user_id,
            created_at: now,
        };

        let entity = self.entities.insert(entity).map_err(|err| match err {
            RepositoryError::Conflict => EntityError::DuplicateSlug(slug),
            other => other.into(),
        })?;
        self.entities.add_member(Membership {
            entity_id: entity.id,
            user_id: actor.user_id,
            role: MemberRole::Owner,
            added_at: now,
        })?;

        info!(entity_id = %entity.id, slug = %entity.slug, owner = %actor.user_id, "entity created");
        Ok(entity)
    }

    /// Apply a partial update. The slug is fixed at creation so public links stay valid.
    pub fn update(
        &self,
        actor: &AuthenticatedUser,
        id: &EntityId,
        update: EntityUpdate,
    ) -> Result<Entity, EntityError> {
        self.require_role(actor, id, MemberRole::Manager)?;
        let mut entity = self.get(id)?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(EntityError::MissingName);
            }
            entity.name = name;
        }
        if update.website.is_some() {
            entity.website = trimmed(update.website);
        }
        if let Some(description) = update.description {
            entity.description = description.trim().to_string();
        }
        if update.industry.is_some() {
            entity.industry = trimmed(update.industry);
        }
        if update.headcount.is_some() {
            entity.headcount = update.headcount;
        }

        self.entities.update(entity.clone())?;
        info!(entity_id = %entity.id, actor = %actor.user_id, "entity updated");
        Ok(entity)
    }

    pub fn add_member(
        &self,
        actor: &AuthenticatedUser,
        id: &EntityId,
        user_id: &UserId,
        role: MemberRole,
    ) -> Result<Membership, EntityError> {
        let _guard = self.roster();
        let actor_role = self.require_role(actor, id, MemberRole::Manager)?;
        if role == MemberRole::Owner && actor_role != MemberRole::Owner {
            return Err(EntityError::InsufficientRole(MemberRole::Owner.label()));
        }

        let user = self
            .users
            .fetch(user_id)?
            .ok_or(EntityError::UserNotFound)?;
        if user.role != Role::Employer {
            return Err(EntityError::NotAnEmployer);
        }

        let membership = Membership {
            entity_id: *id,
            user_id: *user_id,
            role,
            added_at: self.clock.now(),
        };
        self.entities
            .add_member(membership.clone())
            .map_err(|err| match err {
                RepositoryError::Conflict => EntityError::AlreadyMember,
                other => other.into(),
            })?;

        info!(entity_id = %id, user_id = %user_id, role = role.label(), "member added");
        Ok(membership)
    }

    pub fn remove_member(
        &self,
        actor: &AuthenticatedUser,
        id: &EntityId,
        user_id: &UserId,
    ) -> Result<(), EntityError> {
        let _guard = self.roster();
        let actor_role = self.require_role(actor, id, MemberRole::Manager)?;
        let members = self.entities.members(id)?;
        let target = members
            .iter()
            .find(|m| m.user_id == *user_id)
            .ok_or(EntityError::MemberNotFound)?;

        if target.role == MemberRole::Owner {
            if actor_role != MemberRole::Owner {
                return Err(EntityError::InsufficientRole(MemberRole::Owner.label()));
            }
            let owners = members
                .iter()
                .filter(|m| m.role == MemberRole::Owner)
                .count();
            if owners <= 1 {
                warn!(entity_id = %id, "refused to remove the last owner");
                return Err(EntityError::LastOwner);
            }
        }

        self.entities.remove_member(id, user_id)?;
        info!(entity_id = %id, user_id = %user_id, actor = %actor.user_id, "member removed");
        Ok(())
    }

    /// Roster of an entity, visible to its members and administrators.
    pub fn members(
        &self,
        actor: &AuthenticatedUser,
        id: &EntityId,
    ) -> Result<Vec<Membership>, EntityError> {
        if !actor.is_admin() {
            self.require_role(actor, id, MemberRole::Recruiter)?;
        } else {
            self.get(id)?;
        }
        Ok(self.entities.members(id)?)
    }

    pub fn entities_for(&self, user: &UserId) -> Result<Vec<MembershipView>, EntityError> {
        let mut views = Vec::new();
        for membership in self.entities.memberships_for(user)? {
            if let Some(entity) = self.entities.fetch(&membership.entity_id)? {
                views.push(MembershipView {
                    entity,
                    role: membership.role,
                });
            }
        }
        views.sort_by(|a, b| a.entity.name.cmp(&b.entity.name));
        Ok(views)
    }

    pub fn get(&self, id: &EntityId) -> Result<Entity, EntityError> {
        self.entities.fetch(id)?.ok_or(EntityError::NotFound)
    }

    /// Role check shared by every module acting on behalf of an entity.
    pub fn require_role(
        &self,
        actor: &AuthenticatedUser,
        id: &EntityId,
        minimum: MemberRole,
    ) -> Result<MemberRole, EntityError> {
        let entity = self.get(id)?;
        let role = self
            .entities
            .members(&entity.id)?
            .into_iter()
            .find(|m| m.user_id == actor.user_id)
            .map(|m| m.role)
            .ok_or(EntityError::InsufficientRole(minimum.label()))?;

        if role >= minimum {
            Ok(role)
        } else {
            Err(EntityError::InsufficientRole(minimum.label()))
        }
    }

    pub fn verify(&self, admin: &AuthenticatedUser, id: &EntityId) -> Result<Entity, EntityError> {
        if !admin.is_admin() {
            return Err(EntityError::AdminOnly);
        }
        let mut entity = self.get(id)?;
        if !entity.verified {
            entity.verified = true;
            self.entities.update(entity.clone())?;
            info!(entity_id = %entity.id, admin = %admin.user_id, "entity verified");
        }
        Ok(entity)
    }

    /// Members holding at least `minimum`, used to address notifications.
    pub fn member_ids(&self, id: &EntityId, minimum: MemberRole) -> Result<Vec<UserId>, EntityError> {
        Ok(self
            .entities
            .members(id)?
            .into_iter()
            .filter(|m| m.role >= minimum)
            .map(|m| m.user_id)
            .collect())
    }

    fn roster(&self) -> MutexGuard<'_, ()> {
        self.roster_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountStatus, User};
    use crate::clock::ManualClock;
    use crate::store::memory::{InMemoryEntities, InMemoryUsers};
    use chrono::NaiveDate;

    struct Fixture {
        service: EntityService,
        users: Arc<InMemoryUsers>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUsers::default());
        let clock = Arc::new(ManualClock::at_date(
            NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date"),
        ));
        Fixture {
            service: EntityService::new(Arc::new(InMemoryEntities::default()), users.clone(), clock),
            users,
        }
    }

    fn user(fixture: &Fixture, email: &str, role: Role) -> AuthenticatedUser {
        let user = fixture
            .users
            .insert(User {
                id: UserId::generate(),
                email: email.to_string(),
                phone: None,
                full_name: email.to_string(),
                role,
                password_hash: String::new(),
                email_verified: true,
                phone_verified: false,
                status: AccountStatus::Active,
                created_at: chrono::Utc::now(),
            })
            .expect("insert user");
        AuthenticatedUser {
            user_id: user.id,
            role,
        }
    }

    fn acme() -> NewEntity {
        NewEntity {
            name: "Acme Robotics".to_string(),
            website: Some(" https://acme.example ".to_string()),
            description: "Robots".to_string(),
            industry: None,
            headcount: Some(40),
        }
    }

    #[test]
    fn creator_becomes_owner_and_slugs_are_unique() {
        let fixture = fixture();
        let owner = user(&fixture, "owner@acme.io", Role::Employer);

        let entity = fixture.service.create(&owner, acme()).expect("creates");
        assert_eq!(entity.slug, "acme-robotics");
        assert_eq!(entity.website.as_deref(), Some("https://acme.example"));
        assert_eq!(
            fixture
                .service
                .require_role(&owner, &entity.id, MemberRole::Owner)
                .expect("owner"),
            MemberRole::Owner
        );

        let mut clash = acme();
        clash.name = "ACME robotics!".to_string();
        assert!(matches!(
            fixture.service.create(&owner, clash),
            Err(EntityError::DuplicateSlug(slug)) if slug == "acme-robotics"
        ));
    }

    #[test]
    fn candidates_cannot_create_entities() {
        let fixture = fixture();
        let candidate = user(&fixture, "cand@example.com", Role::Candidate);
        assert!(matches!(
            fixture.service.create(&candidate, acme()),
            Err(EntityError::EmployerOnly(_))
        ));
    }

    #[test]
    fn membership_rules_protect_owners() {
        let fixture = fixture();
        let owner = user(&fixture, "owner@acme.io", Role::Employer);
        let manager = user(&fixture, "manager@acme.io", Role::Employer);
        let recruiter = user(&fixture, "recruiter@acme.io", Role::Employer);
        let candidate = user(&fixture, "cand@example.com", Role::Candidate);
        let entity = fixture.service.create(&owner, acme()).expect("creates");

        fixture
            .service
            .add_member(&owner, &entity.id, &manager.user_id, MemberRole::Manager)
            .expect("owner adds manager");
        fixture
            .service
            .add_member(&manager, &entity.id, &recruiter.user_id, MemberRole::Recruiter)
            .expect("manager adds recruiter");

        assert!(matches!(
            fixture
                .service
                .add_member(&manager, &entity.id, &recruiter.user_id, MemberRole::Owner),
            Err(EntityError::InsufficientRole("owner"))
        ));
        assert!(matches!(
            fixture
                .service
                .add_member(&owner, &entity.id, &recruiter.user_id, MemberRole::Recruiter),
            Err(EntityError::AlreadyMember)
        ));
        assert!(matches!(
            fixture
                .service
                .add_member(&owner, &entity.id, &candidate.user_id, MemberRole::Recruiter),
            Err(EntityError::NotAnEmployer)
        ));
        assert!(matches!(
            fixture
                .service
                .add_member(&recruiter, &entity.id, &candidate.user_id, MemberRole::Recruiter),
            Err(EntityError::InsufficientRole("manager"))
        ));

        assert!(matches!(
            fixture
                .service
                .remove_member(&owner, &entity.id, &owner.user_id),
            Err(EntityError::LastOwner)
        ));
        assert!(matches!(
            fixture
                .service
                .remove_member(&manager, &entity.id, &owner.user_id),
            Err(EntityError::InsufficientRole("owner"))
        ));

        fixture
            .service
            .remove_member(&manager, &entity.id, &recruiter.user_id)
            .expect("manager removes recruiter");
        assert_eq!(
            fixture
                .service
                .members(&owner, &entity.id)
                .expect("roster")
                .len(),
            2
        );
        assert_eq!(
            fixture
                .service
                .member_ids(&entity.id, MemberRole::Manager)
                .expect("ids")
                .len(),
            2
        );
    }

    #[test]
    fn update_and_verify_require_the_right_roles() {
        let fixture = fixture();
        let owner = user(&fixture, "owner@acme.io", Role::Employer);
        let outsider = user(&fixture, "other@corp.io", Role::Employer);
        let admin = user(&fixture, "ops@jobhub.test", Role::Admin);
        let entity = fixture.service.create(&owner, acme()).expect("creates");

        let update = EntityUpdate {
            name: Some("Acme Robotics GmbH".to_string()),
            headcount: Some(55),
            ..EntityUpdate::default()
        };
        assert!(matches!(
            fixture.service.update(&outsider, &entity.id, update.clone()),
            Err(EntityError::InsufficientRole(_))
        ));
        let updated = fixture
            .service
            .update(&owner, &entity.id, update)
            .expect("owner updates");
        assert_eq!(updated.name, "Acme Robotics GmbH");
        assert_eq!(updated.slug, "acme-robotics");
        assert_eq!(updated.headcount, Some(55));

        assert!(matches!(
            fixture.service.verify(&owner, &entity.id),
            Err(EntityError::AdminOnly)
        ));
        assert!(fixture.service.verify(&admin, &entity.id).expect("verifies").verified);

        let mine = fixture.service.entities_for(&owner.user_id).expect("list");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].role, MemberRole::Owner);
        assert!(fixture
            .service
            .entities_for(&outsider.user_id)
            .expect("list")
            .is_empty());
    }

    #[test]
    fn owners_removing_each_other_at_once_leave_one_owner() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..100 {
            let fixture = fixture();
            let first = user(&fixture, "first@acme.io", Role::Employer);
            let second = user(&fixture, "second@acme.io", Role::Employer);
            let entity = fixture.service.create(&first, acme()).expect("creates");
            fixture
                .service
                .add_member(&first, &entity.id, &second.user_id, MemberRole::Owner)
                .expect("adds co-owner");

            let service = &fixture.service;
            let barrier = &Barrier::new(2);
            let entity_id = entity.id;
            let removed = thread::scope(|scope| {
                let pairs = [(first, second), (second, first)];
                let handles: Vec<_> = pairs
                    .into_iter()
                    .map(|(actor, target)| {
                        scope.spawn(move || {
                            barrier.wait();
                            service.remove_member(&actor, &entity_id, &target.user_id)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().expect("thread finishes"))
                    .filter(Result::is_ok)
                    .count()
            });

            assert_eq!(removed, 1);
            let owners = fixture
                .service
                .entities
                .members(&entity.id)
                .expect("roster")
                .into_iter()
                .filter(|m| m.role == MemberRole::Owner)
                .count();
            assert_eq!(owners, 1);
        }
    }
}
