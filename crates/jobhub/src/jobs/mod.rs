//! Job postings: drafting, the publication lifecycle, sponsorship, the
//! public listing and bulk CSV import.

pub mod domain;
pub mod import;
pub mod lifecycle;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    EmploymentType, Job, JobDraft, JobRequirements, JobStatus, SalaryRange, Sponsorship, Workplace,
};
pub use import::{ImportError, RowError};
pub use lifecycle::{next_status, JobAction};
pub use query::{JobQuery, Page};
pub use repository::JobRepository;
pub use router::job_router;
pub use service::{JobError, JobService};
