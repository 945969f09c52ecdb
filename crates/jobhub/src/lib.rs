//! Multi-tenant job board: accounts with one-time password verification,
//! employer tenants, job postings with credit billing and sponsorship,
//! candidate profiles and matching, applications and messaging.

pub mod accounts;
pub mod applications;
pub mod billing;
pub mod clock;
pub mod config;
pub mod entities;
pub mod error;
pub mod http;
pub mod ids;
pub mod jobs;
pub mod matching;
pub mod messaging;
pub mod notify;
pub mod platform;
pub mod profiles;
pub mod skills;
pub mod store;
pub mod telemetry;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_support;

pub use platform::{Collaborators, MaintenanceReport, Platform};
