//! Chat-style messages attached to tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Delivery state mirrored from the WhatsApp gateway. Plain data here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhatsappStatus {
    #[default]
    Pending,
    Sent,
    Delivered,
    Failed,
    Read,
}

impl WhatsappStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhatsappStatus::Pending => "pending",
            WhatsappStatus::Sent => "sent",
            WhatsappStatus::Delivered => "delivered",
            WhatsappStatus::Failed => "failed",
            WhatsappStatus::Read => "read",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WhatsappStatus::Pending),
            "sent" => Some(WhatsappStatus::Sent),
            "delivered" => Some(WhatsappStatus::Delivered),
            "failed" => Some(WhatsappStatus::Failed),
            "read" => Some(WhatsappStatus::Read),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub ticket_id: Uuid,
    /// Author user ID.
    pub user_id: Uuid,
    pub content: Option<String>,
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub whatsapp_status: WhatsappStatus,
    pub whatsapp_sid: Option<String>,
    pub is_whatsapp: bool,
}

impl Message {
    pub fn new(ticket_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            user_id,
            content: None,
            image: None,
            timestamp: Utc::now(),
            whatsapp_status: WhatsappStatus::default(),
            whatsapp_sid: None,
            is_whatsapp: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("A message needs content or an image")]
    Empty,
}

/// Maps a [`MessageError`] to an HTTP status code.
pub fn message_error_to_status_code(_error: &MessageError) -> u16 {
    400
}

/// A message must carry text or an image.
pub fn validate_message(message: &Message) -> Result<(), MessageError> {
    let has_content = message
        .content
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    let has_image = message
        .image
        .as_deref()
        .is_some_and(|i| !i.trim().is_empty());
    if has_content || has_image {
        Ok(())
    } else {
        Err(MessageError::Empty)
    }
}

/// Orders messages oldest first.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_message_defaults() {
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(message.whatsapp_status, WhatsappStatus::Pending);
        assert!(!message.is_whatsapp);
    }

    #[test]
    fn test_validate_message() {
        let base = Message::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(validate_message(&base), Err(MessageError::Empty));
        assert_eq!(
            validate_message(&base.clone().with_content("   ")),
            Err(MessageError::Empty)
        );
        assert!(validate_message(&base.clone().with_content("Hello")).is_ok());
        assert!(validate_message(&base.with_image("messages/1.png")).is_ok());
    }

    #[test]
    fn test_whatsapp_status_parse() {
        assert_eq!(WhatsappStatus::parse("read"), Some(WhatsappStatus::Read));
        assert_eq!(WhatsappStatus::parse("lost"), None);
    }

    #[test]
    fn test_sort_messages_oldest_first() {
        let ticket = Uuid::new_v4();
        let user = Uuid::new_v4();
        let mut early = Message::new(ticket, user).with_content("first");
        early.timestamp -= Duration::minutes(5);
        let late = Message::new(ticket, user).with_content("second");
        let mut list = vec![late, early];
        sort_messages(&mut list);
        assert_eq!(list[0].content.as_deref(), Some("first"));
    }
}
