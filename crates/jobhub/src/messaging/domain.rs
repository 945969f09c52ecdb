use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConversationId, MessageId, UserId};

pub const MAX_BODY_CHARS: usize = 5_000;

/// A thread between exactly two users. `participants` is kept sorted so the
/// pair identifies the conversation regardless of who writes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: [UserId; 2],
    pub started_by: UserId,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(started_by: UserId, other: UserId, at: DateTime<Utc>) -> Self {
        Self {
            id: ConversationId::generate(),
            participants: participant_pair(started_by, other),
            started_by,
            created_at: at,
            last_message_at: at,
        }
    }

    pub fn includes(&self, user: &UserId) -> bool {
        self.participants.contains(user)
    }

    pub fn counterpart(&self, user: &UserId) -> UserId {
        if self.participants[0] == *user {
            self.participants[1]
        } else {
            self.participants[0]
        }
    }
}

pub fn participant_pair(a: UserId, b: UserId) -> [UserId; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

/// Inbox row: the conversation, who it is with, the latest message and how
/// many messages the viewer has not read yet.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub counterpart: UserId,
    pub last_message: Option<Message>,
    pub unread: usize,
}
