//! Candidates applying to listed jobs and the hiring pipeline that follows.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{Application, ApplicationStatus, StatusChange};
pub use repository::ApplicationRepository;
pub use router::application_router;
pub use service::{ApplicationError, ApplicationService};
