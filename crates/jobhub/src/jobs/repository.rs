use super::domain::{Job, JobStatus};
use crate::ids::{EntityId, JobId};
use crate::store::RepositoryError;

/// Storage abstraction for job postings.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn insert_many(&self, jobs: Vec<Job>) -> Result<(), RepositoryError>;
    fn update(&self, job: Job) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn by_entity(&self, entity: &EntityId) -> Result<Vec<Job>, RepositoryError>;
    fn by_status(&self, statuses: &[JobStatus]) -> Result<Vec<Job>, RepositoryError>;
}
