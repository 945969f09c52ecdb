use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{error, info, warn};

use super::domain::{
    participant_pair, Conversation, ConversationSummary, Message, MAX_BODY_CHARS,
};
use super::repository::MessageRepository;
use crate::accounts::{AccountError, AccountService, AccountStatus, AuthenticatedUser, Role};
use crate::clock::Clock;
use crate::ids::{ConversationId, MessageId, UserId};
use crate::notify::{Notification, Notifier};
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("message body must not be empty")]
    EmptyBody,
    #[error("message body exceeds 5000 characters")]
    BodyTooLong,
    #[error("cannot send a message to yourself")]
    SelfMessage,
    #[error("recipient is not available")]
    RecipientUnavailable,
    #[error("candidates can only reply to conversations started by an employer")]
    CandidateCannotInitiate,
    #[error("conversation not found")]
    NotFound,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MessagingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MessagingError::EmptyBody
            | MessagingError::BodyTooLong
            | MessagingError::SelfMessage => StatusCode::UNPROCESSABLE_ENTITY,
            MessagingError::CandidateCannotInitiate => StatusCode::FORBIDDEN,
            MessagingError::RecipientUnavailable
            | MessagingError::NotFound
            | MessagingError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            MessagingError::Account(err) => err.status_code(),
            MessagingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct MessagingService {
    messages: Arc<dyn MessageRepository>,
    accounts: Arc<AccountService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl MessagingService {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        accounts: Arc<AccountService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            accounts,
            notifier,
            clock,
        }
    }

    /// Send a message, opening the conversation with the first one.
    pub fn send(
        &self,
        actor: &AuthenticatedUser,
        recipient: &UserId,
        body: &str,
    ) -> Result<Message, MessagingError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(MessagingError::EmptyBody);
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(MessagingError::BodyTooLong);
        }
        if *recipient == actor.user_id {
            return Err(MessagingError::SelfMessage);
        }

        let contact = match self.accounts.contact(recipient) {
            Ok(contact) if contact.status == AccountStatus::Active => contact,
            Ok(_) | Err(AccountError::NotFound) => {
                warn!(sender = %actor.user_id, recipient = %recipient, "message to unavailable recipient");
                return Err(MessagingError::RecipientUnavailable);
            }
            Err(err) => return Err(err.into()),
        };

        let now = self.clock.now();
        let pair = participant_pair(actor.user_id, *recipient);
        let mut conversation = match self.messages.find_conversation(&pair)? {
            Some(existing) => existing,
            None if actor.role == Role::Candidate => {
                return Err(MessagingError::CandidateCannotInitiate)
            }
            None => {
                let conversation = self
                    .messages
                    .insert_conversation(Conversation::new(actor.user_id, *recipient, now))?;
                info!(conversation_id = %conversation.id, started_by = %actor.user_id, "conversation opened");
                conversation
            }
        };

        let message = self.messages.append(Message {
            id: MessageId::generate(),
            conversation_id: conversation.id,
            sender: actor.user_id,
            body: body.to_string(),
            sent_at: now,
            read_at: None,
        })?;
        conversation.last_message_at = now;
        self.messages.update_conversation(conversation)?;

        let notification = Notification::email(
            contact.email,
            "new_message",
            "You have a new message on jobhub.",
        );
        if let Err(err) = self.notifier.notify(notification) {
            error!(%err, recipient = %recipient, "failed to queue message notification");
        }
        Ok(message)
    }

    /// The actor's conversations, most recent activity first.
    pub fn conversations(
        &self,
        actor: &AuthenticatedUser,
    ) -> Result<Vec<ConversationSummary>, MessagingError> {
        let mut conversations = self.messages.conversations_for(&actor.user_id)?;
        conversations.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let messages = self.messages.messages(&conversation.id)?;
            let unread = messages
                .iter()
                .filter(|m| m.sender != actor.user_id && m.read_at.is_none())
                .count();
            summaries.push(ConversationSummary {
                counterpart: conversation.counterpart(&actor.user_id),
                last_message: messages.last().cloned(),
                unread,
                conversation,
            });
        }
        Ok(summaries)
    }

    /// Full thread for a participant. Reading marks the other side's
    /// messages as read.
    pub fn messages(
        &self,
        actor: &AuthenticatedUser,
        id: &ConversationId,
    ) -> Result<Vec<Message>, MessagingError> {
        let conversation = self
            .messages
            .conversation(id)?
            .filter(|c| c.includes(&actor.user_id))
            .ok_or(MessagingError::NotFound)?;

        let read = self
            .messages
            .mark_read(&conversation.id, &actor.user_id, self.clock.now())?;
        if read > 0 {
            info!(conversation_id = %conversation.id, read, "messages read");
        }
        Ok(self.messages.messages(&conversation.id)?)
    }
}
