use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::info;

use crate::ids::{EntityId, OrderId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub entity_id: EntityId,
    pub amount_cents: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment provider unavailable: {0}")]
    Unavailable(String),
}

/// Payment provider seam. Implementations must be idempotent per order id.
pub trait PaymentGateway: Send + Sync {
    fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}

/// Gateway that approves every charge unless switched to decline.
#[derive(Debug, Default)]
pub struct SandboxGateway {
    declining: AtomicBool,
}

impl SandboxGateway {
    pub fn declining() -> Self {
        Self {
            declining: AtomicBool::new(true),
        }
    }

    pub fn set_declining(&self, declining: bool) {
        self.declining.store(declining, Ordering::SeqCst);
    }
}

impl PaymentGateway for SandboxGateway {
    fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        if self.declining.load(Ordering::SeqCst) {
            return Err(PaymentError::Declined("sandbox card declined".to_string()));
        }

        let reference = format!("sandbox-{}", request.order_id.0.simple());
        info!(
            order_id = %request.order_id,
            amount_cents = request.amount_cents,
            %reference,
            "sandbox payment captured"
        );
        Ok(PaymentReceipt { reference })
    }
}
