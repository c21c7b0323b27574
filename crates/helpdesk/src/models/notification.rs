use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::notifications::{time_since, Notification};
use helpdesk_core::tickets::{Ticket, TicketPriority, TicketStatus};

#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread: bool,
}

/// The ticket a notification points at.
#[derive(Debug, Serialize)]
pub struct TicketDetails {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
}

impl From<&Ticket> for TicketDetails {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            code: ticket.code.clone(),
            title: ticket.title.clone(),
            status: ticket.status,
            priority: ticket.priority,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub ticket_id: Option<Uuid>,
    pub ticket_details: Option<TicketDetails>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub time_since: String,
}

impl NotificationView {
    pub fn new(notification: Notification, ticket: Option<&Ticket>, now: DateTime<Utc>) -> Self {
        Self {
            time_since: time_since(notification.created_at, now),
            ticket_details: ticket.map(TicketDetails::from),
            id: notification.id,
            title: notification.title,
            message: notification.message,
            ticket_id: notification.ticket_id,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread_count: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked: usize,
}
