use chrono::{DateTime, Utc};

use super::domain::{Conversation, Message};
use crate::ids::{ConversationId, UserId};
use crate::store::RepositoryError;

pub trait MessageRepository: Send + Sync {
    /// Conflict when a conversation for the same participant pair exists.
    fn insert_conversation(&self, conversation: Conversation)
        -> Result<Conversation, RepositoryError>;
    fn update_conversation(&self, conversation: Conversation) -> Result<(), RepositoryError>;
    fn conversation(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError>;
    fn find_conversation(
        &self,
        participants: &[UserId; 2],
    ) -> Result<Option<Conversation>, RepositoryError>;
    fn conversations_for(&self, user: &UserId) -> Result<Vec<Conversation>, RepositoryError>;
    fn append(&self, message: Message) -> Result<Message, RepositoryError>;
    /// Messages of a conversation in the order they were sent.
    fn messages(&self, conversation: &ConversationId) -> Result<Vec<Message>, RepositoryError>;
    /// Stamp every unread message not sent by `reader`; returns how many changed.
    fn mark_read(
        &self,
        conversation: &ConversationId,
        reader: &UserId,
        at: DateTime<Utc>,
    ) -> Result<usize, RepositoryError>;
}
