use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::notify::Channel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Verification,
    PasswordReset,
}

impl OtpPurpose {
    pub const fn template(self) -> &'static str {
        match self {
            OtpPurpose::Verification => "otp_verification",
            OtpPurpose::PasswordReset => "otp_password_reset",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OtpPurpose::Verification => "verification",
            OtpPurpose::PasswordReset => "password reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("no one-time password is pending; request a new code")]
    Missing,
    #[error("one-time password has expired; request a new code")]
    Expired,
    #[error("one-time password is incorrect ({attempts_left} attempts left)")]
    Invalid { attempts_left: u32 },
    #[error("too many incorrect codes; request a new code")]
    Locked,
}

#[derive(Debug, Clone)]
struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
    attempts_left: u32,
}

type LedgerKey = (UserId, OtpPurpose, Channel);

/// Outstanding one-time passwords, one per user, purpose and channel.
#[derive(Debug)]
pub(crate) struct OtpLedger {
    ttl: Duration,
    max_attempts: u32,
    pending: Mutex<HashMap<LedgerKey, PendingCode>>,
}

pub(crate) fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let code: u32 = rng.gen_range(0..1_000_000);
    format!("{code:06}")
}

impl OtpLedger {
    pub(crate) fn new(ttl: Duration, max_attempts: u32) -> Self {
        Self {
            ttl,
            max_attempts: max_attempts.max(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code, replacing any outstanding one for the same key.
    pub(crate) fn issue(
        &self,
        user: UserId,
        purpose: OtpPurpose,
        channel: Channel,
        now: DateTime<Utc>,
    ) -> String {
        let code = generate_code();
        let entry = PendingCode {
            code: code.clone(),
            expires_at: now + self.ttl,
            attempts_left: self.max_attempts,
        };
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user, purpose, channel), entry);
        code
    }

    /// Check a submitted code. Success and lock-out both consume the entry.
    pub(crate) fn verify(
        &self,
        user: UserId,
        purpose: OtpPurpose,
        channel: Channel,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        let key = (user, purpose, channel);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = pending.get_mut(&key).ok_or(OtpError::Missing)?;

        if now >= entry.expires_at {
            pending.remove(&key);
            return Err(OtpError::Expired);
        }

        if entry.code == submitted.trim() {
            pending.remove(&key);
            return Ok(());
        }

        entry.attempts_left = entry.attempts_left.saturating_sub(1);
        if entry.attempts_left == 0 {
            pending.remove(&key);
            return Err(OtpError::Locked);
        }

        Err(OtpError::Invalid {
            attempts_left: entry.attempts_left,
        })
    }

    pub(crate) fn discard(&self, user: UserId, purpose: OtpPurpose, channel: Channel) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(user, purpose, channel));
    }

    /// Drop every expired entry.
    pub(crate) fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let before = pending.len();
        pending.retain(|_, entry| entry.expires_at > now);
        before - pending.len()
    }
}
