use super::domain::{Order, Subscription, Wallet};
use crate::ids::EntityId;
use crate::store::RepositoryError;

/// Storage abstraction for wallets, subscriptions and orders.
pub trait BillingRepository: Send + Sync {
    fn wallet(&self, entity: &EntityId) -> Result<Option<Wallet>, RepositoryError>;
    fn save_wallet(&self, wallet: Wallet) -> Result<(), RepositoryError>;
    fn subscription(&self, entity: &EntityId) -> Result<Option<Subscription>, RepositoryError>;
    fn save_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError>;
    fn insert_order(&self, order: Order) -> Result<(), RepositoryError>;
    fn update_order(&self, order: Order) -> Result<(), RepositoryError>;
    fn orders(&self, entity: &EntityId) -> Result<Vec<Order>, RepositoryError>;
}
