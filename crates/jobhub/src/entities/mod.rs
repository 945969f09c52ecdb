//! Employer organisations (tenants) and their member roster.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{slugify, Entity, EntityUpdate, MemberRole, Membership, NewEntity};
pub use repository::EntityRepository;
pub use router::entity_router;
pub use service::{EntityError, EntityService, MembershipView};
