use super::domain::Application;
use crate::ids::{ApplicationId, JobId, UserId};
use crate::store::RepositoryError;

/// Storage for applications. A candidate applies to a job at most once, so
/// inserting a second (job, candidate) pair is a `Conflict`.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn by_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError>;
    fn by_candidate(&self, candidate: &UserId) -> Result<Vec<Application>, RepositoryError>;
}
