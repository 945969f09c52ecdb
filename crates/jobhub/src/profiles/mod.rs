//! Candidate résumés ("job profiles") and the derived facts matching relies on.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{DegreeLevel, Education, Experience, JobProfile, ProfileDraft};
pub use repository::ProfileRepository;
pub use router::profile_router;
pub use service::{ProfileError, ProfileService};
