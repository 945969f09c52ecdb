use super::domain::User;
use crate::ids::UserId;
use crate::store::RepositoryError;

/// Storage abstraction for accounts. E-mail and phone are unique keys.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn update(&self, user: User) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError>;
}
