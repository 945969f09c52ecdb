use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEVELOPMENT_JWT_SECRET: &str = "jobhub-development-secret-change-me";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub marketplace: MarketplaceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match env::var("APP_JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingSecret("APP_JWT_SECRET"))
            }
            _ => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let auth = AuthConfig {
            jwt_secret,
            token_ttl: Duration::from_secs(numeric("APP_TOKEN_TTL_HOURS", 24)? * 3600),
            otp_ttl: Duration::from_secs(numeric("APP_OTP_TTL_SECONDS", 300)?),
            otp_max_attempts: numeric("APP_OTP_MAX_ATTEMPTS", 5)? as u32,
            otp_resend_limit: numeric("APP_OTP_RESEND_LIMIT", 3)? as u32,
            otp_resend_window: Duration::from_secs(numeric("APP_OTP_RESEND_WINDOW_SECONDS", 600)?),
            login_attempt_limit: numeric("APP_LOGIN_ATTEMPT_LIMIT", 5)? as u32,
            login_window: Duration::from_secs(numeric("APP_LOGIN_WINDOW_SECONDS", 900)?),
        };

        let marketplace = MarketplaceConfig {
            listing_days: numeric("APP_LISTING_DAYS", 30)? as u32,
            sponsor_credits_per_day: numeric("APP_SPONSOR_CREDITS_PER_DAY", 1)? as u32,
            expiry_sweep_interval: Duration::from_secs(numeric("APP_EXPIRY_SWEEP_SECONDS", 300)?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth,
            marketplace,
        })
    }
}

fn numeric(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber(key)),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Token signing, one-time password and login throttling settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub otp_ttl: Duration,
    pub otp_max_attempts: u32,
    pub otp_resend_limit: u32,
    pub otp_resend_window: Duration,
    pub login_attempt_limit: u32,
    pub login_window: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(24 * 3600),
            otp_ttl: Duration::from_secs(300),
            otp_max_attempts: 5,
            otp_resend_limit: 3,
            otp_resend_window: Duration::from_secs(600),
            login_attempt_limit: 5,
            login_window: Duration::from_secs(900),
        }
    }
}

/// Listing windows and sponsorship pricing.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub listing_days: u32,
    pub sponsor_credits_per_day: u32,
    pub expiry_sweep_interval: Duration,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            listing_days: 30,
            sponsor_credits_per_day: 1,
            expiry_sweep_interval: Duration::from_secs(300),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber(&'static str),
    MissingSecret(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber(key) => {
                write!(f, "{key} must be a non-negative integer")
            }
            ConfigError::MissingSecret(key) => {
                write!(f, "{key} must be set when running in production")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber(_)
            | ConfigError::MissingSecret(_) => None,
        }
    }
}
