use super::domain::{Entity, Membership};
use crate::ids::{EntityId, UserId};
use crate::store::RepositoryError;

/// Storage abstraction for entities and memberships. Slugs are unique and a
/// user holds at most one membership per entity.
pub trait EntityRepository: Send + Sync {
    fn insert(&self, entity: Entity) -> Result<Entity, RepositoryError>;
    fn update(&self, entity: Entity) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EntityId) -> Result<Option<Entity>, RepositoryError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Entity>, RepositoryError>;
    fn add_member(&self, membership: Membership) -> Result<(), RepositoryError>;
    fn remove_member(&self, entity: &EntityId, user: &UserId) -> Result<(), RepositoryError>;
    fn members(&self, entity: &EntityId) -> Result<Vec<Membership>, RepositoryError>;
    fn memberships_for(&self, user: &UserId) -> Result<Vec<Membership>, RepositoryError>;
}
