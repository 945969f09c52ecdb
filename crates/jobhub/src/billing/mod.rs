//! Credit packs, posting subscriptions and the charges jobs make against them.

pub mod catalog;
pub mod domain;
pub mod gateway;
pub mod repository;
pub mod router;
pub mod service;

pub use catalog::{catalog, find_plan};
pub use domain::{
    ChargeReceipt, LedgerEntry, Order, OrderStatus, Plan, PlanKind, Subscription, Wallet,
};
pub use gateway::{PaymentError, PaymentGateway, PaymentReceipt, PaymentRequest, SandboxGateway};
pub use repository::BillingRepository;
pub use router::billing_router;
pub use service::{BillingError, BillingService};
