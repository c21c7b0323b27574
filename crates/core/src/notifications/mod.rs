mod operations;
mod types;

pub use operations::{
    sort_notifications, ticket_assigned_notification, ticket_created_notifications, time_since,
    TICKET_ASSIGNED_TITLE, TICKET_CREATED_TITLE,
};
pub use types::Notification;
