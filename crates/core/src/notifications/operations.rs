use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::accounts::User;
use crate::tickets::Ticket;

use super::types::Notification;

pub const TICKET_CREATED_TITLE: &str = "Nouveau ticket créé";
pub const TICKET_ASSIGNED_TITLE: &str = "Ticket assigné";

/// One notification per active admin for a freshly created ticket.
pub fn ticket_created_notifications(
    ticket: &Ticket,
    client: &User,
    admins: &[User],
) -> Vec<Notification> {
    let message = format!(
        "Le ticket '{}' a été créé par {}.",
        ticket.title,
        client.full_name()
    );
    admins
        .iter()
        .filter(|admin| admin.is_active && admin.is_admin())
        .map(|admin| {
            Notification::new(admin.id, TICKET_CREATED_TITLE, message.clone()).with_ticket(ticket.id)
        })
        .collect()
}

/// Notification for the technician user a ticket was just assigned to.
pub fn ticket_assigned_notification(ticket: &Ticket, technician_user_id: Uuid) -> Notification {
    let message = format!(
        "Le ticket '{}' vous a été assigné. Priorité: {}.",
        ticket.title,
        ticket.priority.label()
    );
    Notification::new(technician_user_id, TICKET_ASSIGNED_TITLE, message).with_ticket(ticket.id)
}

const UNITS: [(i64, &str, &str); 6] = [
    (60 * 60 * 24 * 365, "year", "years"),
    (60 * 60 * 24 * 30, "month", "months"),
    (60 * 60 * 24 * 7, "week", "weeks"),
    (60 * 60 * 24, "day", "days"),
    (60 * 60, "hour", "hours"),
    (60, "minute", "minutes"),
];

fn plural(count: i64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Elapsed time between `created` and `now`, e.g. `"2 days, 3 hours"`.
///
/// Shows at most two adjacent units. Under a minute (or in the future)
/// reads `"0 minutes"`.
pub fn time_since(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created).num_seconds();
    if seconds < 60 {
        return "0 minutes".to_string();
    }
    let Some(index) = UNITS.iter().position(|(size, _, _)| seconds / size > 0) else {
        return "0 minutes".to_string();
    };
    let (size, singular, plural_name) = UNITS[index];
    let count = seconds / size;
    let mut result = plural(count, singular, plural_name);

    if let Some((next_size, next_singular, next_plural)) = UNITS.get(index + 1) {
        let remainder = (seconds - count * size) / next_size;
        if remainder > 0 {
            result.push_str(", ");
            result.push_str(&plural(remainder, next_singular, next_plural));
        }
    }
    result
}

/// Newest first.
pub fn sort_notifications(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
