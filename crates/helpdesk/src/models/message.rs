use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::accounts::{User, UserType};
use helpdesk_core::messages::{Message, WhatsappStatus};
use helpdesk_core::serde::deserialize_optional_string;

#[derive(Debug, Deserialize)]
pub struct CreateMessage {
    pub ticket_id: Uuid,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub image: Option<String>,
}

impl CreateMessage {
    pub fn into_message(self, author_id: Uuid) -> Message {
        let mut message = Message::new(self.ticket_id, author_id);
        message.content = self.content;
        message.image = self.image;
        message
    }
}

/// A message as seen by one reader.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    /// Author's "first last". Empty when the author has no name set.
    pub user_name: String,
    pub user_type: Option<UserType>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub whatsapp_status: WhatsappStatus,
    pub whatsapp_sid: Option<String>,
    pub is_whatsapp: bool,
    pub is_own_message: bool,
}

impl MessageView {
    pub fn new(message: Message, author: Option<&User>, reader_id: Uuid) -> Self {
        Self {
            user_name: author.map(User::full_name).unwrap_or_default(),
            user_type: author.map(|u| u.user_type),
            is_own_message: message.user_id == reader_id,
            id: message.id,
            ticket_id: message.ticket_id,
            user_id: message.user_id,
            content: message.content,
            image: message.image,
            timestamp: message.timestamp,
            whatsapp_status: message.whatsapp_status,
            whatsapp_sid: message.whatsapp_sid,
            is_whatsapp: message.is_whatsapp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_message_defaults() {
        let payload: CreateMessage = serde_json::from_str(&format!(
            r#"{{"ticket_id": "{}", "content": "Hello", "image": ""}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        let author = Uuid::new_v4();

        let message = payload.into_message(author);

        assert_eq!(message.user_id, author);
        assert_eq!(message.content.as_deref(), Some("Hello"));
        assert_eq!(message.image, None);
        assert_eq!(message.whatsapp_status, WhatsappStatus::Pending);
        assert!(!message.is_whatsapp);
    }

    #[test]
    fn test_view_marks_own_messages() {
        let author = User::new("tech", "tech@example.com", UserType::Technician)
            .with_name("Paul", "Martin");
        let message = Message::new(Uuid::new_v4(), author.id).with_content("On my way");

        let own = MessageView::new(message.clone(), Some(&author), author.id);
        let other = MessageView::new(message, Some(&author), Uuid::new_v4());

        assert!(own.is_own_message);
        assert!(!other.is_own_message);
        assert_eq!(own.user_name, "Paul Martin");
        assert_eq!(own.user_type, Some(UserType::Technician));
    }
}
