//! Ticket conversation handlers. Listing lives with the ticket routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use helpdesk_core::messages::validate_message;

use super::error::json_body;
use super::tickets::visible_ticket;
use super::{Actor, AppError};
use crate::models::{CreateMessage, MessageView};
use crate::state::AppState;

/// Post a message on a ticket (POST /api/messages).
pub async fn create_message(
    actor: Actor,
    State(state): State<AppState>,
    payload: Result<Json<CreateMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageView>), AppError> {
    let message = json_body(payload)?.into_message(actor.user.id);
    validate_message(&message)?;
    visible_ticket(&state, &actor, message.ticket_id).await?;

    state.messages.create_message(&message).await?;

    tracing::info!(message_id = %message.id, ticket_id = %message.ticket_id, "Created message");

    let view = MessageView::new(message, Some(&actor.user), actor.user.id);
    Ok((StatusCode::CREATED, Json(view)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use helpdesk_core::tickets::TicketStatus;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_create_message_defaults() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let response = app
            .post(
                "/api/messages",
                Some(client.id),
                json!({"ticket_id": ticket.id, "content": "Still broken"}),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.json["user_id"], client.id.to_string());
        assert_eq!(response.json["user_name"], "Jane Doe");
        assert_eq!(response.json["whatsapp_status"], "pending");
        assert_eq!(response.json["is_whatsapp"], false);
        assert_eq!(response.json["is_own_message"], true);
    }

    #[tokio::test]
    async fn test_image_only_message_is_accepted() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let response = app
            .post(
                "/api/messages",
                Some(client.id),
                json!({"ticket_id": ticket.id, "image": "messages/screen.png"}),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.json["content"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let response = app
            .post(
                "/api/messages",
                Some(client.id),
                json!({"ticket_id": ticket.id, "content": "   "}),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], "A message needs content or an image");
    }

    #[tokio::test]
    async fn test_message_on_foreign_ticket_is_404() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let (other, _) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let response = app
            .post(
                "/api/messages",
                Some(other.id),
                json!({"ticket_id": ticket.id, "content": "Hello"}),
            )
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
