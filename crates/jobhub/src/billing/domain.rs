use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, OrderId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanKind {
    CreditPack {
        credits: u32,
    },
    Subscription {
        postings: u32,
        period_days: u32,
        candidate_search: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub code: String,
    pub name: String,
    pub price_cents: u64,
    pub kind: PlanKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub at: DateTime<Utc>,
    pub delta: i64,
    pub balance_after: u32,
    pub reason: String,
}

/// Prepaid credits of one entity. The balance only changes through
/// [`Wallet::credit`] and [`Wallet::debit`], both of which append to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub entity_id: EntityId,
    pub credits: u32,
    pub ledger: Vec<LedgerEntry>,
}

impl Wallet {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            credits: 0,
            ledger: Vec::new(),
        }
    }

    pub fn credit(&mut self, amount: u32, reason: impl Into<String>, at: DateTime<Utc>) {
        if amount == 0 {
            return;
        }
        self.credits = self.credits.saturating_add(amount);
        self.ledger.push(LedgerEntry {
            at,
            delta: i64::from(amount),
            balance_after: self.credits,
            reason: reason.into(),
        });
    }

    /// Remove credits, refusing rather than going negative. Returns the
    /// balance that was available on failure.
    pub fn debit(
        &mut self,
        amount: u32,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), u32> {
        if amount > self.credits {
            return Err(self.credits);
        }
        if amount == 0 {
            return Ok(());
        }
        self.credits -= amount;
        self.ledger.push(LedgerEntry {
            at,
            delta: -i64::from(amount),
            balance_after: self.credits,
            reason: reason.into(),
        });
        Ok(())
    }
}

/// Posting allowance bought for a period. `ends_on` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub entity_id: EntityId,
    pub plan_code: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub postings_allowed: u32,
    pub postings_used: u32,
    pub candidate_search: bool,
}

impl Subscription {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.starts_on <= today && today < self.ends_on
    }

    pub fn remaining_postings(&self) -> u32 {
        self.postings_allowed.saturating_sub(self.postings_used)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub entity_id: EntityId,
    pub plan_code: String,
    pub amount_cents: u64,
    pub status: OrderStatus,
    pub payment_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What a publication consumed, kept on the job so it can be returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ChargeReceipt {
    Subscription { plan_code: String },
    Credits { credits: u32 },
}
