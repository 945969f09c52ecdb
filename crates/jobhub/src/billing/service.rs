use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::StatusCode;
use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use super::catalog::{catalog, find_plan};
use super::domain::{ChargeReceipt, Order, OrderStatus, Plan, PlanKind, Subscription, Wallet};
use super::gateway::{PaymentError, PaymentGateway, PaymentRequest};
use super::repository::BillingRepository;
use crate::accounts::AuthenticatedUser;
use crate::clock::Clock;
use crate::entities::{EntityError, EntityService, MemberRole};
use crate::ids::{EntityId, OrderId};
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("unknown plan `{0}`")]
    UnknownPlan(String),
    #[error("insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: u32, available: u32 },
    #[error(transparent)]
    PaymentFailed(#[from] PaymentError),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BillingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::UnknownPlan(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BillingError::InsufficientCredits { .. } | BillingError::PaymentFailed(_) => {
                StatusCode::PAYMENT_REQUIRED
            }
            BillingError::Entity(err) => err.status_code(),
            BillingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Service owning every change to an entity's credits and subscription.
pub struct BillingService {
    billing: Arc<dyn BillingRepository>,
    entities: Arc<EntityService>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    sponsor_credits_per_day: u32,
    balance_guard: Mutex<()>,
}

impl BillingService {
    pub fn new(
        billing: Arc<dyn BillingRepository>,
        entities: Arc<EntityService>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        sponsor_credits_per_day: u32,
    ) -> Self {
        Self {
            billing,
            entities,
            gateway,
            clock,
            sponsor_credits_per_day,
            balance_guard: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> Vec<Plan> {
        catalog()
    }

    pub fn sponsor_credits_per_day(&self) -> u32 {
        self.sponsor_credits_per_day
    }

    /// Buy a plan for the entity. A declined payment leaves the order
    /// `Failed` and the wallet untouched.
    pub fn purchase(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
        plan_code: &str,
    ) -> Result<Order, BillingError> {
        self.entities
            .require_role(actor, entity, MemberRole::Manager)?;
        let plan =
            find_plan(plan_code).ok_or_else(|| BillingError::UnknownPlan(plan_code.to_string()))?;

        let now = self.clock.now();
        let mut order = Order {
            id: OrderId::generate(),
            entity_id: *entity,
            plan_code: plan.code.clone(),
            amount_cents: plan.price_cents,
            status: OrderStatus::Pending,
            payment_reference: None,
            failure_reason: None,
            created_at: now,
        };
        self.billing.insert_order(order.clone())?;

        let request = PaymentRequest {
            order_id: order.id,
            entity_id: *entity,
            amount_cents: plan.price_cents,
            description: plan.name.clone(),
        };

        let receipt = match self.gateway.charge(&request) {
            Ok(receipt) => receipt,
            Err(err) => {
                order.status = OrderStatus::Failed;
                order.failure_reason = Some(err.to_string());
                self.billing.update_order(order)?;
                warn!(entity_id = %entity, plan = %plan.code, %err, "payment failed");
                return Err(err.into());
            }
        };

        let _guard = self.guard();
        match &plan.kind {
            PlanKind::CreditPack { credits } => {
                let mut wallet = self.load_wallet(entity)?;
                wallet.credit(
                    *credits,
                    format!("purchase {} (order {})", plan.code, order.id),
                    now,
                );
                self.billing.save_wallet(wallet)?;
            }
            PlanKind::Subscription {
                postings,
                period_days,
                candidate_search,
            } => {
                let today = now.date_naive();
                let period = Duration::days(i64::from(*period_days));
                let subscription = match self.billing.subscription(entity)? {
                    Some(mut current)
                        if current.plan_code == plan.code && current.is_active(today) =>
                    {
                        current.ends_on += period;
                        current.postings_allowed += postings;
                        current
                    }
                    _ => Subscription {
                        entity_id: *entity,
                        plan_code: plan.code.clone(),
                        starts_on: today,
                        ends_on: today + period,
                        postings_allowed: *postings,
                        postings_used: 0,
                        candidate_search: *candidate_search,
                    },
                };
                self.billing.save_subscription(subscription)?;
            }
        }

        order.status = OrderStatus::Paid;
        order.payment_reference = Some(receipt.reference);
        self.billing.update_order(order.clone())?;
        info!(entity_id = %entity, plan = %plan.code, order_id = %order.id, "order paid");
        Ok(order)
    }

    /// Pay for one publication: subscription allowance first, then one credit.
    pub fn charge_publication(
        &self,
        entity: &EntityId,
        today: NaiveDate,
    ) -> Result<ChargeReceipt, BillingError> {
        let _guard = self.guard();

        if let Some(mut subscription) = self.billing.subscription(entity)? {
            if subscription.is_active(today) && subscription.remaining_postings() > 0 {
                subscription.postings_used += 1;
                let plan_code = subscription.plan_code.clone();
                self.billing.save_subscription(subscription)?;
                return Ok(ChargeReceipt::Subscription { plan_code });
            }
        }

        self.debit(entity, 1, "job publication")?;
        Ok(ChargeReceipt::Credits { credits: 1 })
    }

    /// Give back whatever a publication charge consumed.
    pub fn refund_publication(
        &self,
        entity: &EntityId,
        receipt: &ChargeReceipt,
    ) -> Result<(), BillingError> {
        match receipt {
            ChargeReceipt::Subscription { plan_code } => {
                let _guard = self.guard();
                if let Some(mut subscription) = self.billing.subscription(entity)? {
                    if subscription.plan_code == *plan_code && subscription.postings_used > 0 {
                        subscription.postings_used -= 1;
                        self.billing.save_subscription(subscription)?;
                    }
                }
                Ok(())
            }
            ChargeReceipt::Credits { credits } => {
                self.refund_credits(entity, *credits, "publication refund")?;
                Ok(())
            }
        }
    }

    /// Charge a sponsorship of `days`. Subscriptions never cover sponsorship.
    pub fn charge_sponsorship(&self, entity: &EntityId, days: u32) -> Result<u32, BillingError> {
        let credits = days.saturating_mul(self.sponsor_credits_per_day);
        let _guard = self.guard();
        self.debit(entity, credits, &format!("sponsorship for {days} days"))?;
        Ok(credits)
    }

    pub fn refund_credits(
        &self,
        entity: &EntityId,
        credits: u32,
        reason: &str,
    ) -> Result<Wallet, BillingError> {
        let _guard = self.guard();
        let mut wallet = self.load_wallet(entity)?;
        if credits > 0 {
            wallet.credit(credits, reason, self.clock.now());
            self.billing.save_wallet(wallet.clone())?;
            info!(entity_id = %entity, credits, reason, "credits refunded");
        }
        Ok(wallet)
    }

    pub fn has_candidate_search(
        &self,
        entity: &EntityId,
        today: NaiveDate,
    ) -> Result<bool, BillingError> {
        Ok(self
            .billing
            .subscription(entity)?
            .is_some_and(|s| s.candidate_search && s.is_active(today)))
    }

    pub fn wallet(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
    ) -> Result<Wallet, BillingError> {
        self.entities
            .require_role(actor, entity, MemberRole::Recruiter)?;
        self.load_wallet(entity)
    }

    pub fn subscription(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
    ) -> Result<Option<Subscription>, BillingError> {
        self.entities
            .require_role(actor, entity, MemberRole::Recruiter)?;
        Ok(self.billing.subscription(entity)?)
    }

    /// Order history, newest first.
    pub fn orders(
        &self,
        actor: &AuthenticatedUser,
        entity: &EntityId,
    ) -> Result<Vec<Order>, BillingError> {
        self.entities
            .require_role(actor, entity, MemberRole::Manager)?;
        let mut orders = self.billing.orders(entity)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Callers must hold the balance guard.
    fn debit(&self, entity: &EntityId, credits: u32, reason: &str) -> Result<(), BillingError> {
        let mut wallet = self.load_wallet(entity)?;
        wallet
            .debit(credits, reason, self.clock.now())
            .map_err(|available| {
                warn!(entity_id = %entity, required = credits, available, "insufficient credits");
                BillingError::InsufficientCredits {
                    required: credits,
                    available,
                }
            })?;
        if credits > 0 {
            self.billing.save_wallet(wallet)?;
        }
        Ok(())
    }

    fn load_wallet(&self, entity: &EntityId) -> Result<Wallet, BillingError> {
        Ok(self
            .billing
            .wallet(entity)?
            .unwrap_or_else(|| Wallet::new(*entity)))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.balance_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
