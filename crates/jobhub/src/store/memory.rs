//! Mutex-guarded maps implementing every repository trait. The running
//! service and the test suites both use these.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{lock, RepositoryError};
use crate::accounts::{User, UserRepository};
use crate::applications::{Application, ApplicationRepository};
use crate::billing::{BillingRepository, Order, Subscription, Wallet};
use crate::entities::{Entity, EntityRepository, Membership};
use crate::ids::{ApplicationId, ConversationId, EntityId, JobId, OrderId, UserId};
use crate::jobs::{Job, JobRepository, JobStatus};
use crate::messaging::{Conversation, Message, MessageRepository};
use crate::profiles::{JobProfile, ProfileRepository};

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    users: Mutex<BTreeMap<UserId, User>>,
}

impl InMemoryUsers {
    fn clashes(existing: &User, candidate: &User) -> bool {
        existing.id != candidate.id
            && (existing.email == candidate.email
                || (candidate.phone.is_some() && existing.phone == candidate.phone))
    }
}

impl UserRepository for InMemoryUsers {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = lock(&self.users)?;
        if users.contains_key(&user.id) || users.values().any(|u| Self::clashes(u, &user)) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update(&self, user: User) -> Result<(), RepositoryError> {
        let mut users = lock(&self.users)?;
        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if users.values().any(|u| Self::clashes(u, &user)) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user);
        Ok(())
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned())
    }
}

#[derive(Debug, Default)]
struct EntityTables {
    entities: BTreeMap<EntityId, Entity>,
    members: BTreeMap<(EntityId, UserId), Membership>,
}

#[derive(Debug, Default)]
pub struct InMemoryEntities {
    tables: Mutex<EntityTables>,
}

impl EntityRepository for InMemoryEntities {
    fn insert(&self, entity: Entity) -> Result<Entity, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.entities.contains_key(&entity.id)
            || tables.entities.values().any(|e| e.slug == entity.slug)
        {
            return Err(RepositoryError::Conflict);
        }
        tables.entities.insert(entity.id, entity.clone());
        Ok(entity)
    }

    fn update(&self, entity: Entity) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.entities.get_mut(&entity.id) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &EntityId) -> Result<Option<Entity>, RepositoryError> {
        Ok(lock(&self.tables)?.entities.get(id).cloned())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Option<Entity>, RepositoryError> {
        Ok(lock(&self.tables)?
            .entities
            .values()
            .find(|e| e.slug == slug)
            .cloned())
    }

    fn add_member(&self, membership: Membership) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if !tables.entities.contains_key(&membership.entity_id) {
            return Err(RepositoryError::NotFound);
        }
        let key = (membership.entity_id, membership.user_id);
        if tables.members.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        tables.members.insert(key, membership);
        Ok(())
    }

    fn remove_member(&self, entity: &EntityId, user: &UserId) -> Result<(), RepositoryError> {
        lock(&self.tables)?
            .members
            .remove(&(*entity, *user))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn members(&self, entity: &EntityId) -> Result<Vec<Membership>, RepositoryError> {
        Ok(lock(&self.tables)?
            .members
            .values()
            .filter(|m| m.entity_id == *entity)
            .cloned()
            .collect())
    }

    fn memberships_for(&self, user: &UserId) -> Result<Vec<Membership>, RepositoryError> {
        Ok(lock(&self.tables)?
            .members
            .values()
            .filter(|m| m.user_id == *user)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct BillingTables {
    wallets: BTreeMap<EntityId, Wallet>,
    subscriptions: BTreeMap<EntityId, Subscription>,
    orders: BTreeMap<OrderId, Order>,
}

#[derive(Debug, Default)]
pub struct InMemoryBilling {
    tables: Mutex<BillingTables>,
}

impl BillingRepository for InMemoryBilling {
    fn wallet(&self, entity: &EntityId) -> Result<Option<Wallet>, RepositoryError> {
        Ok(lock(&self.tables)?.wallets.get(entity).cloned())
    }

    fn save_wallet(&self, wallet: Wallet) -> Result<(), RepositoryError> {
        lock(&self.tables)?.wallets.insert(wallet.entity_id, wallet);
        Ok(())
    }

    fn subscription(&self, entity: &EntityId) -> Result<Option<Subscription>, RepositoryError> {
        Ok(lock(&self.tables)?.subscriptions.get(entity).cloned())
    }

    fn save_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError> {
        lock(&self.tables)?
            .subscriptions
            .insert(subscription.entity_id, subscription);
        Ok(())
    }

    fn insert_order(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if tables.orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.orders.insert(order.id, order);
        Ok(())
    }

    fn update_order(&self, order: Order) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn orders(&self, entity: &EntityId) -> Result<Vec<Order>, RepositoryError> {
        Ok(lock(&self.tables)?
            .orders
            .values()
            .filter(|o| o.entity_id == *entity)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryJobs {
    jobs: Mutex<BTreeMap<JobId, Job>>,
}

impl JobRepository for InMemoryJobs {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut jobs = lock(&self.jobs)?;
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn insert_many(&self, batch: Vec<Job>) -> Result<(), RepositoryError> {
        let mut jobs = lock(&self.jobs)?;
        let mut seen = BTreeSet::new();
        if batch
            .iter()
            .any(|job| jobs.contains_key(&job.id) || !seen.insert(job.id))
        {
            return Err(RepositoryError::Conflict);
        }
        for job in batch {
            jobs.insert(job.id, job);
        }
        Ok(())
    }

    fn update(&self, job: Job) -> Result<(), RepositoryError> {
        let mut jobs = lock(&self.jobs)?;
        match jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(lock(&self.jobs)?.get(id).cloned())
    }

    fn by_entity(&self, entity: &EntityId) -> Result<Vec<Job>, RepositoryError> {
        Ok(lock(&self.jobs)?
            .values()
            .filter(|job| job.entity_id == *entity)
            .cloned()
            .collect())
    }

    fn by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, RepositoryError> {
        Ok(lock(&self.jobs)?
            .values()
            .filter(|job| statuses.contains(&job.status))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    profiles: Mutex<BTreeMap<UserId, JobProfile>>,
}

impl ProfileRepository for InMemoryProfiles {
    fn upsert(&self, profile: JobProfile) -> Result<(), RepositoryError> {
        lock(&self.profiles)?.insert(profile.user_id, profile);
        Ok(())
    }

    fn fetch(&self, user: &UserId) -> Result<Option<JobProfile>, RepositoryError> {
        Ok(lock(&self.profiles)?.get(user).cloned())
    }

    fn open_to_work(&self) -> Result<Vec<JobProfile>, RepositoryError> {
        Ok(lock(&self.profiles)?
            .values()
            .filter(|p| p.open_to_work)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryApplications {
    applications: Mutex<BTreeMap<ApplicationId, Application>>,
}

impl ApplicationRepository for InMemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut applications = lock(&self.applications)?;
        let duplicate = applications.values().any(|a| {
            a.id == application.id
                || (a.job_id == application.job_id && a.candidate_id == application.candidate_id)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut applications = lock(&self.applications)?;
        match applications.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(lock(&self.applications)?.get(id).cloned())
    }

    fn by_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock(&self.applications)?
            .values()
            .filter(|a| a.job_id == *job)
            .cloned()
            .collect())
    }

    fn by_candidate(&self, candidate: &UserId) -> Result<Vec<Application>, RepositoryError> {
        Ok(lock(&self.applications)?
            .values()
            .filter(|a| a.candidate_id == *candidate)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct MessageTables {
    conversations: BTreeMap<ConversationId, Conversation>,
    messages: BTreeMap<ConversationId, Vec<Message>>,
}

#[derive(Debug, Default)]
pub struct InMemoryMessages {
    tables: Mutex<MessageTables>,
}

impl MessageRepository for InMemoryMessages {
    fn insert_conversation(
        &self,
        conversation: Conversation,
    ) -> Result<Conversation, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let exists = tables.conversations.values().any(|c| {
            c.id == conversation.id || c.participants == conversation.participants
        });
        if exists {
            return Err(RepositoryError::Conflict);
        }
        tables
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    fn update_conversation(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        let mut tables = lock(&self.tables)?;
        match tables.conversations.get_mut(&conversation.id) {
            Some(slot) => {
                *slot = conversation;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn conversation(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        Ok(lock(&self.tables)?.conversations.get(id).cloned())
    }

    fn find_conversation(
        &self,
        participants: &[UserId; 2],
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(lock(&self.tables)?
            .conversations
            .values()
            .find(|c| c.participants == *participants)
            .cloned())
    }

    fn conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>, RepositoryError> {
        Ok(lock(&self.tables)?
            .conversations
            .values()
            .filter(|c| c.includes(user))
            .cloned()
            .collect())
    }

    fn append(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        if !tables.conversations.contains_key(&message.conversation_id) {
            return Err(RepositoryError::NotFound);
        }
        tables
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, RepositoryError> {
        Ok(lock(&self.tables)?
            .messages
            .get(conversation)
            .cloned()
            .unwrap_or_default())
    }

    fn mark_read(
        &self,
        conversation: &ConversationId,
        reader: &UserId,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError> {
        let mut tables = lock(&self.tables)?;
        let mut changed = 0;
        if let Some(messages) = tables.messages.get_mut(conversation) {
            for message in messages
                .iter_mut()
                .filter(|m| m.sender != *reader && m.read_at.is_none())
            {
                message.read_at = Some(at);
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountStatus, Role};

    fn user(email: &str, phone: Option<&str>) -> User {
        User {
            id: UserId::generate(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            full_name: "Test User".to_string(),
            role: Role::Candidate,
            password_hash: String::new(),
            email_verified: false,
            phone_verified: false,
            status: AccountStatus::PendingVerification,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn email_and_phone_are_unique_keys() {
        let users = InMemoryUsers::default();
        users
            .insert(user("a@example.com", Some("+4915112345678")))
            .expect("first insert");

        assert_eq!(
            users.insert(user("a@example.com", None)),
            Err(RepositoryError::Conflict)
        );
        assert_eq!(
            users.insert(user("b@example.com", Some("+4915112345678"))),
            Err(RepositoryError::Conflict)
        );
        assert!(users.insert(user("b@example.com", None)).is_ok());
        assert!(users.insert(user("c@example.com", None)).is_ok());
    }

    #[test]
    fn updating_unknown_user_is_not_found() {
        let users = InMemoryUsers::default();
        assert_eq!(
            users.update(user("ghost@example.com", None)),
            Err(RepositoryError::NotFound)
        );
    }

    #[test]
    fn mark_read_skips_own_messages() {
        let store = InMemoryMessages::default();
        let a = UserId::generate();
        let b = UserId::generate();
        let conversation = store
            .insert_conversation(Conversation::new(a, b, Utc::now()))
            .expect("opens");
        for sender in [a, b, a] {
            store
                .append(Message {
                    id: crate::ids::MessageId::generate(),
                    conversation_id: conversation.id,
                    sender,
                    body: "hello".to_string(),
                    sent_at: Utc::now(),
                    read_at: None,
                })
                .expect("appends");
        }

        assert_eq!(store.mark_read(&conversation.id, &b, Utc::now()), Ok(2));
        assert_eq!(store.mark_read(&conversation.id, &b, Utc::now()), Ok(0));
        assert_eq!(store.mark_read(&conversation.id, &a, Utc::now()), Ok(1));
    }
}
