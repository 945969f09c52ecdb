use super::domain::JobProfile;
use crate::ids::UserId;
use crate::store::RepositoryError;

/// Storage abstraction for profiles, keyed by their owner.
pub trait ProfileRepository: Send + Sync {
    fn upsert(&self, profile: JobProfile) -> Result<(), RepositoryError>;
    fn fetch(&self, user: &UserId) -> Result<Option<JobProfile>, RepositoryError>;
    fn open_to_work(&self) -> Result<Vec<JobProfile>, RepositoryError>;
}
