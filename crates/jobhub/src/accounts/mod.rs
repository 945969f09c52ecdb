//! Registration, one-time password verification, login and token issuance.

pub mod domain;
pub(crate) mod otp;
pub(crate) mod password;
pub mod repository;
pub mod router;
pub mod service;
pub mod token;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    AccountStatus, AuthenticatedUser, RegistrationRequest, Role, User, UserView,
};
pub use otp::{OtpError, OtpPurpose};
pub use repository::UserRepository;
pub use router::account_router;
pub use service::{AccountError, AccountService, LoginResponse};
pub use token::{Claims, IssuedToken, TokenAuthority, TokenError};
pub use validation::ValidationError;
