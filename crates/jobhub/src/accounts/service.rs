use std::sync::{Arc, Mutex, PoisonError};

use axum::http::StatusCode;
use chrono::Duration;
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{AccountStatus, AuthenticatedUser, RegistrationRequest, Role, User, UserView};
use super::otp::{OtpError, OtpLedger, OtpPurpose};
use super::password::{self, PasswordError};
use super::repository::UserRepository;
use super::token::{IssuedToken, TokenAuthority, TokenError};
use super::validation::{
    normalize_email, normalize_name, normalize_phone, validate_password, ValidationError,
};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::http::Authenticator;
use crate::ids::UserId;
use crate::notify::{Channel, Notification, Notifier, NotifyError};
use crate::store::RepositoryError;
use crate::throttle::{NaiveFlowRate, Throttle, ThrottleDecision};

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("an account with this {0} already exists")]
    Duplicate(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account has not been verified yet")]
    NotVerified,
    #[error("account is suspended")]
    Suspended,
    #[error("account not found")]
    NotFound,
    #[error("{0} is already verified")]
    AlreadyVerified(&'static str),
    #[error(transparent)]
    Otp(#[from] OtpError),
    #[error("too many attempts; retry in {retry_after_secs} seconds")]
    Throttled { retry_after_secs: i64 },
    #[error("authentication required")]
    Unauthorized,
    #[error("operation requires the {0} role")]
    Forbidden(&'static str),
    #[error("administrators cannot suspend themselves")]
    CannotSuspendSelf,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("background task failed: {0}")]
    Worker(String),
}

impl AccountError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccountError::Invalid(_) | AccountError::Otp(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AccountError::Duplicate(_) | AccountError::AlreadyVerified(_) => StatusCode::CONFLICT,
            AccountError::InvalidCredentials
            | AccountError::Unauthorized
            | AccountError::Token(TokenError::Invalid | TokenError::Expired) => {
                StatusCode::UNAUTHORIZED
            }
            AccountError::NotVerified
            | AccountError::Suspended
            | AccountError::Forbidden(_)
            | AccountError::CannotSuspendSelf => StatusCode::FORBIDDEN,
            AccountError::NotFound | AccountError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            AccountError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            AccountError::Token(TokenError::Signing(_))
            | AccountError::Password(_)
            | AccountError::Repository(_)
            | AccountError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub user: UserView,
}

/// Service owning the account lifecycle.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    tokens: TokenAuthority,
    otps: OtpLedger,
    otp_sends: Mutex<Throttle<String>>,
    login_failures: Mutex<Throttle<String, NaiveFlowRate>>,
}

fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            notifier,
            clock,
            tokens: TokenAuthority::new(&config.jwt_secret, to_chrono(config.token_ttl)),
            otps: OtpLedger::new(to_chrono(config.otp_ttl), config.otp_max_attempts),
            otp_sends: Mutex::new(Throttle::new(
                config.otp_resend_limit,
                to_chrono(config.otp_resend_window),
            )),
            login_failures: Mutex::new(Throttle::new(
                config.login_attempt_limit,
                to_chrono(config.login_window),
            )),
        }
    }

    /// Create a pending account and send verification codes.
    pub fn register(&self, request: RegistrationRequest) -> Result<UserView, AccountError> {
        if request.role == Role::Admin {
            return Err(ValidationError::RoleNotSelectable.into());
        }

        let email = normalize_email(&request.email)?;
        let phone = request
            .phone
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(normalize_phone)
            .transpose()?;
        let full_name = normalize_name(&request.full_name)?;
        validate_password(&request.password)?;

        if self.users.find_by_email(&email)?.is_some() {
            return Err(AccountError::Duplicate("email"));
        }
        if let Some(phone) = &phone {
            if self.users.find_by_phone(phone)?.is_some() {
                return Err(AccountError::Duplicate("phone number"));
            }
        }

        self.ensure_send_allowed(&email)?;
        if let Some(phone) = &phone {
            self.ensure_send_allowed(phone)?;
        }

        let password_hash = password::hash_password(&request.password)?;
        let user = User {
            id: UserId::generate(),
            email,
            phone,
            full_name,
            role: request.role,
            password_hash,
            email_verified: false,
            phone_verified: false,
            status: AccountStatus::PendingVerification,
            created_at: self.clock.now(),
        };

        let user = self.users.insert(user).map_err(|err| match err {
            RepositoryError::Conflict => AccountError::Duplicate("email"),
            other => other.into(),
        })?;
        info!(user_id = %user.id, role = user.role.label(), "account registered");

        self.send_code(&user, OtpPurpose::Verification, Channel::Email)?;
        if user.phone.is_some() {
            self.send_code(&user, OtpPurpose::Verification, Channel::Sms)?;
        }

        Ok(user.view())
    }

    /// Create an already verified, active account. Used to bootstrap
    /// administrators and seed demo data; skips the one-time password step.
    pub fn provision(
        &self,
        email: &str,
        full_name: &str,
        password: &str,
        role: Role,
    ) -> Result<UserView, AccountError> {
        let email = normalize_email(email)?;
        let full_name = normalize_name(full_name)?;
        validate_password(password)?;

        let user = User {
            id: UserId::generate(),
            email,
            phone: None,
            full_name,
            role,
            password_hash: password::hash_password(password)?,
            email_verified: true,
            phone_verified: false,
            status: AccountStatus::Active,
            created_at: self.clock.now(),
        };

        let user = self.users.insert(user).map_err(|err| match err {
            RepositoryError::Conflict => AccountError::Duplicate("email"),
            other => other.into(),
        })?;
        info!(user_id = %user.id, role = user.role.label(), "account provisioned");
        Ok(user.view())
    }

    /// Confirm ownership of the e-mail address or phone number.
    pub fn verify_otp(
        &self,
        email: &str,
        channel: Channel,
        code: &str,
    ) -> Result<UserView, AccountError> {
        let mut user = self.user_by_email(email)?;
        self.otps.verify(
            user.id,
            OtpPurpose::Verification,
            channel,
            code,
            self.clock.now(),
        )?;

        match channel {
            Channel::Email => user.email_verified = true,
            Channel::Sms => user.phone_verified = true,
        }
        if user.status == AccountStatus::PendingVerification && user.email_verified {
            user.status = AccountStatus::Active;
        }

        self.users.update(user.clone())?;
        info!(user_id = %user.id, channel = channel.label(), status = user.status.label(), "contact verified");
        Ok(user.view())
    }

    /// Succeeds without sending anything for unknown addresses, like
    /// `request_password_reset`.
    pub fn resend_otp(&self, email: &str, channel: Channel) -> Result<(), AccountError> {
        let email = normalize_email(email)?;
        let Some(user) = self.users.find_by_email(&email)? else {
            info!("verification resend requested for unknown address");
            return Ok(());
        };
        let already_verified = match channel {
            Channel::Email => user.email_verified,
            Channel::Sms => user.phone_verified,
        };
        if already_verified {
            return Err(AccountError::AlreadyVerified(channel.label()));
        }

        self.send_code(&user, OtpPurpose::Verification, channel)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AccountError> {
        let email = normalize_email(email).map_err(|_| AccountError::InvalidCredentials)?;
        let now = self.clock.now();

        if let ThrottleDecision::Limited { retry_after } = self.login_throttle().check(&email, now)
        {
            warn!(%email, "login throttled");
            return Err(AccountError::Throttled {
                retry_after_secs: retry_after.num_seconds().max(1),
            });
        }

        let authenticated = match self.users.find_by_email(&email)? {
            Some(user) if password::verify_password(&user.password_hash, password)? => Some(user),
            Some(_) => None,
            None => {
                password::verify_decoy(password);
                None
            }
        };

        let Some(user) = authenticated else {
            self.login_throttle().hit(email.clone(), now);
            warn!(%email, "failed login attempt");
            return Err(AccountError::InvalidCredentials);
        };

        match user.status {
            AccountStatus::PendingVerification => return Err(AccountError::NotVerified),
            AccountStatus::Suspended => return Err(AccountError::Suspended),
            AccountStatus::Active => {}
        }

        self.login_throttle().reset(&email);
        let IssuedToken { token, expires_at } = self.tokens.issue(&user, now)?;
        info!(user_id = %user.id, "login succeeded");

        Ok(LoginResponse {
            token,
            expires_at,
            user: user.view(),
        })
    }

    /// Resolve a bearer token to an active user.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AccountError> {
        let claims = self.tokens.verify(token, self.clock.now())?;
        let user_id = claims.user_id()?;
        let user = self
            .users
            .fetch(&user_id)?
            .ok_or(AccountError::Unauthorized)?;

        match user.status {
            AccountStatus::Active => Ok(AuthenticatedUser {
                user_id: user.id,
                role: user.role,
            }),
            AccountStatus::Suspended => Err(AccountError::Suspended),
            AccountStatus::PendingVerification => Err(AccountError::Unauthorized),
        }
    }

    /// Always succeeds for unknown addresses so the endpoint does not reveal
    /// which e-mails are registered.
    pub fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        let email = normalize_email(email)?;
        match self.users.find_by_email(&email)? {
            Some(user) => self.send_code(&user, OtpPurpose::PasswordReset, Channel::Email),
            None => {
                info!("password reset requested for unknown address");
                Ok(())
            }
        }
    }

    pub fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        validate_password(new_password)?;
        let mut user = self
            .user_by_email(email)
            .map_err(|_| AccountError::Otp(OtpError::Missing))?;

        self.otps.verify(
            user.id,
            OtpPurpose::PasswordReset,
            Channel::Email,
            code,
            self.clock.now(),
        )?;

        user.password_hash = password::hash_password(new_password)?;
        self.users.update(user.clone())?;
        self.login_throttle().reset(&user.email);
        info!(user_id = %user.id, "password reset");
        Ok(())
    }

    pub fn change_password(
        &self,
        actor: &AuthenticatedUser,
        current: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let mut user = self.fetch(&actor.user_id)?;
        if !password::verify_password(&user.password_hash, current)? {
            return Err(AccountError::InvalidCredentials);
        }
        validate_password(new_password)?;

        user.password_hash = password::hash_password(new_password)?;
        self.users.update(user)?;
        self.otps
            .discard(actor.user_id, OtpPurpose::PasswordReset, Channel::Email);
        info!(user_id = %actor.user_id, "password changed");
        Ok(())
    }

    pub fn profile(&self, actor: &AuthenticatedUser) -> Result<UserView, AccountError> {
        Ok(self.fetch(&actor.user_id)?.view())
    }

    pub fn suspend(
        &self,
        admin: &AuthenticatedUser,
        target: &UserId,
    ) -> Result<UserView, AccountError> {
        require_admin(admin)?;
        if admin.user_id == *target {
            return Err(AccountError::CannotSuspendSelf);
        }

        let mut user = self.fetch(target)?;
        user.status = AccountStatus::Suspended;
        self.users.update(user.clone())?;
        warn!(user_id = %user.id, admin = %admin.user_id, "account suspended");
        Ok(user.view())
    }

    pub fn reinstate(
        &self,
        admin: &AuthenticatedUser,
        target: &UserId,
    ) -> Result<UserView, AccountError> {
        require_admin(admin)?;
        let mut user = self.fetch(target)?;
        if user.status == AccountStatus::Suspended {
            user.status = if user.email_verified {
                AccountStatus::Active
            } else {
                AccountStatus::PendingVerification
            };
            self.users.update(user.clone())?;
            info!(user_id = %user.id, admin = %admin.user_id, "account reinstated");
        }
        Ok(user.view())
    }

    /// Drop expired codes and idle throttle keys.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        self.otp_throttle().prune(now);
        self.login_throttle().prune(now);
        self.otps.purge_expired(now)
    }

    /// Refuses up front when a code could not be sent to `destination` now.
    fn ensure_send_allowed(&self, destination: &str) -> Result<(), AccountError> {
        let destination = destination.to_string();
        match self.otp_throttle().check(&destination, self.clock.now()) {
            ThrottleDecision::Allowed { .. } => Ok(()),
            ThrottleDecision::Limited { retry_after } => {
                warn!("registration refused, verification codes throttled");
                Err(AccountError::Throttled {
                    retry_after_secs: retry_after.num_seconds().max(1),
                })
            }
        }
    }

    fn send_code(
        &self,
        user: &User,
        purpose: OtpPurpose,
        channel: Channel,
    ) -> Result<(), AccountError> {
        let destination = match channel {
            Channel::Email => user.email.clone(),
            Channel::Sms => user.phone.clone().ok_or(ValidationError::MissingPhone)?,
        };

        let now = self.clock.now();
        if let ThrottleDecision::Limited { retry_after } =
            self.otp_throttle().hit(destination.clone(), now)
        {
            warn!(user_id = %user.id, channel = channel.label(), "one-time password throttled");
            return Err(AccountError::Throttled {
                retry_after_secs: retry_after.num_seconds().max(1),
            });
        }

        let code = self.otps.issue(user.id, purpose, channel, now);
        let minutes = self.otps.ttl().num_minutes().max(1);
        let notification = Notification::new(
            channel,
            destination,
            purpose.template(),
            format!("Your jobhub {} code is {code}. It expires in {minutes} minutes.", purpose.label()),
        );

        if let Err(err) = self.notifier.notify(notification) {
            log_notify_failure(user.id, channel, &err);
        }
        Ok(())
    }

    /// Contact details for notifications sent by other modules.
    pub fn contact(&self, id: &UserId) -> Result<UserView, AccountError> {
        Ok(self.fetch(id)?.view())
    }

    fn user_by_email(&self, email: &str) -> Result<User, AccountError> {
        let email = normalize_email(email)?;
        self.users
            .find_by_email(&email)?
            .ok_or(AccountError::NotFound)
    }

    fn fetch(&self, id: &UserId) -> Result<User, AccountError> {
        self.users.fetch(id)?.ok_or(AccountError::NotFound)
    }

    fn otp_throttle(&self) -> std::sync::MutexGuard<'_, Throttle<String>> {
        self.otp_sends.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn login_throttle(&self) -> std::sync::MutexGuard<'_, Throttle<String, NaiveFlowRate>> {
        self.login_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn require_admin(actor: &AuthenticatedUser) -> Result<(), AccountError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AccountError::Forbidden(Role::Admin.label()))
    }
}

fn log_notify_failure(user: UserId, channel: Channel, err: &NotifyError) {
    error!(%err, user_id = %user, channel = channel.label(), "failed to queue one-time password");
}

impl Authenticator for AccountService {
    fn authenticate(&self, bearer: &str) -> Result<AuthenticatedUser, AccountError> {
        AccountService::authenticate(self, bearer)
    }
}
