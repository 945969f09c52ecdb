//! Direct messages between employers and candidates.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Conversation, ConversationSummary, Message};
pub use repository::MessageRepository;
pub use router::messaging_router;
pub use service::{MessagingError, MessagingService};
