//! In-app notifications of the acting user.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use helpdesk_core::notifications::sort_notifications;

use super::error::not_found;
use super::{Actor, AppError};
use crate::models::{ListNotificationsQuery, MarkedRead, NotificationView, UnreadCount};
use crate::state::AppState;

/// List the actor's notifications, newest first (GET /api/notifications).
pub async fn list_notifications(
    actor: Actor,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<NotificationView>>, AppError> {
    let mut notifications = state
        .notifications
        .list_notifications(actor.user.id, query.unread)
        .await?;
    sort_notifications(&mut notifications);

    let mut tickets = HashMap::new();
    for ticket_id in notifications.iter().filter_map(|n| n.ticket_id) {
        if !tickets.contains_key(&ticket_id) {
            let ticket = state.tickets.get_ticket(ticket_id).await?;
            tickets.insert(ticket_id, ticket);
        }
    }

    let now = Utc::now();
    Ok(Json(
        notifications
            .into_iter()
            .map(|notification| {
                let ticket = notification
                    .ticket_id
                    .and_then(|id| tickets.get(&id))
                    .and_then(Option::as_ref);
                NotificationView::new(notification, ticket, now)
            })
            .collect(),
    ))
}

/// Mark one notification read (POST /api/notifications/{id}/read).
///
/// Someone else's notification reads as missing.
pub async fn mark_read(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationView>, AppError> {
    let mut notification = state
        .notifications
        .get_notification(id)
        .await?
        .filter(|n| n.user_id == actor.user.id)
        .ok_or_else(|| not_found("Notification"))?;

    state.notifications.mark_read(id).await?;
    notification.is_read = true;

    let ticket = match notification.ticket_id {
        Some(ticket_id) => state.tickets.get_ticket(ticket_id).await?,
        None => None,
    };
    Ok(Json(NotificationView::new(
        notification,
        ticket.as_ref(),
        Utc::now(),
    )))
}

/// Mark every notification of the actor read (POST /api/notifications/read-all).
pub async fn mark_all_read(
    actor: Actor,
    State(state): State<AppState>,
) -> Result<Json<MarkedRead>, AppError> {
    let marked = state.notifications.mark_all_read(actor.user.id).await?;

    tracing::debug!(user_id = %actor.user.id, marked, "Marked notifications read");

    Ok(Json(MarkedRead { marked }))
}

/// Number of unread notifications (GET /api/notifications/unread-count).
pub async fn unread_count(
    actor: Actor,
    State(state): State<AppState>,
) -> Result<Json<UnreadCount>, AppError> {
    let unread_count = state.notifications.unread_count(actor.user.id).await?;

    Ok(Json(UnreadCount { unread_count }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;

    use helpdesk_core::notifications::Notification;
    use helpdesk_core::tickets::TicketStatus;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_list_newest_first_with_ticket_details() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        let mut older = Notification::new(client.id, "Old", "First");
        older.created_at = Utc::now() - Duration::days(2);
        let newer = Notification::new(client.id, "New", "Second").with_ticket(ticket.id);
        app.state
            .notifications
            .create_notifications(&[older, newer])
            .await
            .unwrap();

        let response = app.get("/api/notifications", Some(client.id)).await;

        let list = response.json.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["title"], "New");
        assert_eq!(list[0]["ticket_details"]["code"], ticket.code);
        assert_eq!(list[1]["ticket_details"], serde_json::Value::Null);
        assert_eq!(list[1]["time_since"], "2 days");
    }

    #[tokio::test]
    async fn test_mark_read_is_owner_only() {
        let app = TestApp::new();
        let (client, _) = app.client().await;
        let (other, _) = app.client().await;
        let notification = Notification::new(client.id, "Hello", "World");
        app.state
            .notifications
            .create_notifications(std::slice::from_ref(&notification))
            .await
            .unwrap();
        let uri = format!("/api/notifications/{}/read", notification.id);

        let foreign = app.post(&uri, Some(other.id), json!({})).await;
        let own = app.post(&uri, Some(client.id), json!({})).await;

        assert_eq!(foreign.status, StatusCode::NOT_FOUND);
        assert_eq!(own.status, StatusCode::OK);
        assert_eq!(own.json["is_read"], true);
    }

    #[tokio::test]
    async fn test_read_all_and_unread_count() {
        let app = TestApp::new();
        let (client, _) = app.client().await;
        let (other, _) = app.client().await;
        let notifications = vec![
            Notification::new(client.id, "A", "a"),
            Notification::new(client.id, "B", "b"),
            Notification::new(other.id, "C", "c"),
        ];
        app.state
            .notifications
            .create_notifications(&notifications)
            .await
            .unwrap();

        let before = app.get("/api/notifications/unread-count", Some(client.id)).await;
        let marked = app
            .post("/api/notifications/read-all", Some(client.id), json!({}))
            .await;
        let after = app.get("/api/notifications/unread-count", Some(client.id)).await;
        let unread = app.get("/api/notifications?unread=true", Some(client.id)).await;
        let untouched = app.get("/api/notifications/unread-count", Some(other.id)).await;

        assert_eq!(before.json["unread_count"], 2);
        assert_eq!(marked.json["marked"], 2);
        assert_eq!(after.json["unread_count"], 0);
        assert!(unread.json.as_array().unwrap().is_empty());
        assert_eq!(untouched.json["unread_count"], 1);
    }
}
