//! Ticket handlers.
//!
//! Every route is scoped to the acting user: clients see the tickets they
//! filed, technicians the tickets assigned to them, admins everything.
//! A ticket outside the actor's scope reads as 404.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use uuid::Uuid;

use helpdesk_core::interventions::sort_interventions;
use helpdesk_core::messages::sort_messages;
use helpdesk_core::notifications::{ticket_assigned_notification, ticket_created_notifications};
use helpdesk_core::storage::TicketFilter;
use helpdesk_core::tickets::{
    newly_assigned_technician, next_ticket_code, resolve_ticket_client, sort_tickets_newest_first,
    ticket_scope_for, validate_ticket, Ticket,
};

use super::error::{json_body, not_found};
use super::{Actor, AppError};
use crate::models::{
    CreateTicket, InterventionView, ListTicketsQuery, MessageView, PartySummary, TicketView,
    UpdateTicket,
};
use crate::state::AppState;

/// Resolves client and technician summaries, once per profile.
struct Parties<'a> {
    state: &'a AppState,
    seen: HashMap<Uuid, Option<PartySummary>>,
}

impl<'a> Parties<'a> {
    fn new(state: &'a AppState) -> Self {
        Self {
            state,
            seen: HashMap::new(),
        }
    }

    async fn client(&mut self, id: Uuid) -> Result<Option<PartySummary>, AppError> {
        if let Some(summary) = self.seen.get(&id) {
            return Ok(summary.clone());
        }
        let summary = match self.state.users.get_client(id).await? {
            Some(client) => self
                .state
                .users
                .get_user(client.user_id)
                .await?
                .map(|user| PartySummary::new(client.id, &user)),
            None => None,
        };
        self.seen.insert(id, summary.clone());
        Ok(summary)
    }

    async fn technician(&mut self, id: Uuid) -> Result<Option<PartySummary>, AppError> {
        if let Some(summary) = self.seen.get(&id) {
            return Ok(summary.clone());
        }
        let summary = match self.state.users.get_technician(id).await? {
            Some(technician) => self
                .state
                .users
                .get_user(technician.user_id)
                .await?
                .map(|user| PartySummary::new(technician.id, &user)),
            None => None,
        };
        self.seen.insert(id, summary.clone());
        Ok(summary)
    }

    async fn view(&mut self, ticket: Ticket) -> Result<TicketView, AppError> {
        let client = self.client(ticket.client_id).await?;
        let technician = match ticket.technician_id {
            Some(id) => self.technician(id).await?,
            None => None,
        };
        Ok(TicketView::new(ticket, client, technician, &self.state.media))
    }
}

/// Loads a ticket the actor is allowed to see.
pub(crate) async fn visible_ticket(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
) -> Result<Ticket, AppError> {
    let scope = ticket_scope_for(&actor.user, actor.profile.as_ref());
    state
        .tickets
        .get_ticket(id)
        .await?
        .filter(|ticket| scope.includes(ticket))
        .ok_or_else(|| not_found("Ticket"))
}

/// Notifies the user behind a technician profile about an assignment.
async fn notify_assignment(
    state: &AppState,
    ticket: &Ticket,
    technician_id: Uuid,
) -> Result<(), AppError> {
    let Some(technician) = state.users.get_technician(technician_id).await? else {
        tracing::warn!(ticket_id = %ticket.id, technician_id = %technician_id, "Assigned technician vanished");
        return Ok(());
    };
    let notification = ticket_assigned_notification(ticket, technician.user_id);
    state
        .notifications
        .create_notifications(std::slice::from_ref(&notification))
        .await?;
    Ok(())
}

/// Tells the admins about a new ticket, and its technician when assigned.
async fn notify_ticket_created(
    state: &AppState,
    ticket: &Ticket,
    client_user_id: Uuid,
) -> Result<(), AppError> {
    let client_user = state
        .users
        .get_user(client_user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;
    let admins: Vec<_> = state
        .users
        .list_users()
        .await?
        .into_iter()
        .filter(|user| user.is_admin())
        .collect();
    let notifications = ticket_created_notifications(ticket, &client_user, &admins);
    state.notifications.create_notifications(&notifications).await?;

    if let Some(technician_id) = ticket.technician_id {
        notify_assignment(state, ticket, technician_id).await?;
    }
    Ok(())
}

async fn ensure_technician_exists(state: &AppState, id: Uuid) -> Result<(), AppError> {
    state
        .users
        .get_technician(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found("Technician"))
}

/// List tickets visible to the actor (GET /api/tickets).
pub async fn list_tickets(
    actor: Actor,
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> Result<Json<Vec<TicketView>>, AppError> {
    let filter = TicketFilter {
        scope: ticket_scope_for(&actor.user, actor.profile.as_ref()),
        status: query.status,
        priority: query.priority,
    };

    let mut tickets = state.tickets.list_tickets(&filter).await?;
    sort_tickets_newest_first(&mut tickets);

    let mut parties = Parties::new(&state);
    let mut views = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        views.push(parties.view(ticket).await?);
    }
    Ok(Json(views))
}

/// File a ticket (POST /api/tickets).
///
/// Clients file on their own profile; admins must name the client. The
/// code is allocated under `AppState::ticket_codes`.
pub async fn create_ticket(
    actor: Actor,
    State(state): State<AppState>,
    payload: Result<Json<CreateTicket>, JsonRejection>,
) -> Result<(StatusCode, Json<TicketView>), AppError> {
    let payload = json_body(payload)?;
    let client_id = resolve_ticket_client(&actor.user, actor.profile.as_ref(), payload.client_id)?;

    let client = state
        .users
        .get_client(client_id)
        .await?
        .ok_or_else(|| not_found("Client"))?;
    if let Some(technician_id) = payload.technician_id {
        ensure_technician_exists(&state, technician_id).await?;
    }

    let mut ticket = payload.into_ticket(client.id);
    validate_ticket(&ticket)?;

    {
        let _guard = state.ticket_codes.lock().await;
        // Creation order must follow code order for the latest-code lookup.
        ticket = ticket.with_created_at(Utc::now());
        let year = ticket.created_at.year();
        let last_code = state.tickets.latest_ticket_code(year).await?;
        ticket.code = next_ticket_code(last_code.as_deref(), year)?;
        state.tickets.create_ticket(&ticket).await?;
    }

    tracing::info!(ticket_id = %ticket.id, code = %ticket.code, "Created ticket");

    // The ticket is stored; a failed notification must not fail the request.
    if let Err(err) = notify_ticket_created(&state, &ticket, client.user_id).await {
        tracing::warn!(ticket_id = %ticket.id, error = %err.0, "Failed to notify ticket creation");
    }

    let view = Parties::new(&state).view(ticket).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a ticket (GET /api/tickets/{id}).
pub async fn get_ticket(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketView>, AppError> {
    let ticket = visible_ticket(&state, &actor, id).await?;

    Ok(Json(Parties::new(&state).view(ticket).await?))
}

/// Partially update a ticket (PUT/PATCH /api/tickets/{id}).
///
/// The code never changes. A change of assignee notifies the new technician.
pub async fn update_ticket(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTicket>, JsonRejection>,
) -> Result<Json<TicketView>, AppError> {
    let payload = json_body(payload)?;
    let mut ticket = visible_ticket(&state, &actor, id).await?;
    let previous_technician = ticket.technician_id;

    payload.apply_to(&mut ticket);
    validate_ticket(&ticket)?;

    let assigned = newly_assigned_technician(previous_technician, ticket.technician_id);
    if let Some(technician_id) = assigned {
        ensure_technician_exists(&state, technician_id).await?;
    }

    state.tickets.update_ticket(&ticket).await?;

    tracing::info!(ticket_id = %id, status = %ticket.status, "Updated ticket");

    if let Some(technician_id) = assigned {
        if let Err(err) = notify_assignment(&state, &ticket, technician_id).await {
            tracing::warn!(ticket_id = %id, error = %err.0, "Failed to notify assignment");
        }
    }

    Ok(Json(Parties::new(&state).view(ticket).await?))
}

/// Delete a ticket with its interventions, messages and notifications
/// (DELETE /api/tickets/{id}).
pub async fn delete_ticket(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    visible_ticket(&state, &actor, id).await?;
    state.tickets.delete_ticket(id).await?;

    tracing::info!(ticket_id = %id, "Deleted ticket");

    Ok(StatusCode::NO_CONTENT)
}

/// Interventions of a ticket (GET /api/tickets/{id}/interventions).
pub async fn list_ticket_interventions(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InterventionView>>, AppError> {
    visible_ticket(&state, &actor, id).await?;

    let mut interventions = state.interventions.list_interventions(Some(id)).await?;
    sort_interventions(&mut interventions);

    Ok(Json(
        interventions
            .into_iter()
            .map(|intervention| InterventionView::new(intervention, &state.media))
            .collect(),
    ))
}

/// Conversation of a ticket, oldest first (GET /api/tickets/{id}/messages).
pub async fn list_ticket_messages(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageView>>, AppError> {
    visible_ticket(&state, &actor, id).await?;

    let mut messages = state.messages.list_messages(id).await?;
    sort_messages(&mut messages);

    let mut authors = HashMap::new();
    let mut views = Vec::with_capacity(messages.len());
    for message in messages {
        if !authors.contains_key(&message.user_id) {
            let author = state.users.get_user(message.user_id).await?;
            authors.insert(message.user_id, author);
        }
        let author = authors.get(&message.user_id).and_then(Option::as_ref);
        views.push(MessageView::new(message, author, actor.user.id));
    }
    Ok(Json(views))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use chrono::{Datelike, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use helpdesk_core::messages::Message;
    use helpdesk_core::notifications::{Notification, TICKET_ASSIGNED_TITLE, TICKET_CREATED_TITLE};
    use helpdesk_core::storage::{NotificationRepository, RepositoryError, Result as RepoResult};
    use helpdesk_core::tickets::TicketStatus;

    use crate::handlers::test_support::TestApp;
    use crate::state::AppState;

    fn ticket_body() -> serde_json::Value {
        json!({"title": "Printer jam", "description": "Tray 2 is stuck", "priority": "high"})
    }

    /// Notification store that is always down.
    struct UnavailableNotifications;

    fn unavailable() -> RepositoryError {
        RepositoryError::ConnectionFailed("notification store unavailable".to_string())
    }

    #[async_trait]
    impl NotificationRepository for UnavailableNotifications {
        async fn get_notification(&self, _id: Uuid) -> RepoResult<Option<Notification>> {
            Err(unavailable())
        }

        async fn list_notifications(
            &self,
            _user_id: Uuid,
            _unread_only: bool,
        ) -> RepoResult<Vec<Notification>> {
            Err(unavailable())
        }

        async fn create_notifications(&self, _notifications: &[Notification]) -> RepoResult<()> {
            Err(unavailable())
        }

        async fn mark_read(&self, _id: Uuid) -> RepoResult<()> {
            Err(unavailable())
        }

        async fn mark_all_read(&self, _user_id: Uuid) -> RepoResult<usize> {
            Err(unavailable())
        }

        async fn unread_count(&self, _user_id: Uuid) -> RepoResult<usize> {
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn test_ticket_is_created_when_notifications_fail() {
        let mut state = AppState::default();
        state.notifications = Arc::new(UnavailableNotifications);
        let app = TestApp::with_state(state);
        app.admin().await;
        let (client, _) = app.client().await;
        let (_, tech) = app.technician().await;
        let mut body = ticket_body();
        body["technician_id"] = json!(tech.id);

        let created = app.post("/api/tickets", Some(client.id), body).await;
        let listed = app.get("/api/tickets", Some(client.id)).await;

        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(listed.json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assignment_succeeds_when_notifications_fail() {
        let mut state = AppState::default();
        state.notifications = Arc::new(UnavailableNotifications);
        let app = TestApp::with_state(state);
        let admin = app.admin().await;
        let (_, profile) = app.client().await;
        let (_, tech) = app.technician().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let updated = app
            .put(
                &format!("/api/tickets/{}", ticket.id),
                Some(admin.id),
                json!({"technician_id": tech.id}),
            )
            .await;

        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.json["technician"]["id"], tech.id.to_string());
    }

    #[tokio::test]
    async fn test_client_files_ticket_with_sequential_codes() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let year = Utc::now().year();

        let first = app.post("/api/tickets", Some(client.id), ticket_body()).await;
        let second = app.post("/api/tickets", Some(client.id), ticket_body()).await;

        assert_eq!(first.status, StatusCode::CREATED);
        assert_eq!(first.json["code"], format!("TKT-N001-{year}"));
        assert_eq!(second.json["code"], format!("TKT-N002-{year}"));
        assert_eq!(first.json["client"]["id"], profile.id.to_string());
        assert_eq!(first.json["client"]["full_name"], "Jane Doe");
        assert_eq!(first.json["status"], "open");
        assert_eq!(first.json["priority_display"], "High");
    }

    #[tokio::test]
    async fn test_concurrent_creations_get_distinct_codes() {
        let app = TestApp::new();
        let (client, _) = app.client().await;

        let (a, b, c) = tokio::join!(
            app.post("/api/tickets", Some(client.id), ticket_body()),
            app.post("/api/tickets", Some(client.id), ticket_body()),
            app.post("/api/tickets", Some(client.id), ticket_body()),
        );

        let mut codes: Vec<String> = [a, b, c]
            .iter()
            .map(|r| r.json["code"].as_str().unwrap().to_string())
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 3);
    }

    #[tokio::test]
    async fn test_admin_must_name_existing_client() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (_, profile) = app.client().await;

        let missing = app.post("/api/tickets", Some(admin.id), ticket_body()).await;
        let mut unknown_body = ticket_body();
        unknown_body["client_id"] = json!(uuid::Uuid::new_v4());
        let unknown = app.post("/api/tickets", Some(admin.id), unknown_body).await;
        let mut body = ticket_body();
        body["client_id"] = json!(profile.id);
        let created = app.post("/api/tickets", Some(admin.id), body).await;

        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.json["client_id"], profile.id.to_string());
    }

    #[tokio::test]
    async fn test_technician_cannot_file_tickets() {
        let app = TestApp::new();
        let (tech, _) = app.technician().await;

        let response = app.post("/api/tickets", Some(tech.id), ticket_body()).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], "Only clients or admins can create tickets");
    }

    #[tokio::test]
    async fn test_creation_notifies_admins_and_assignee() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (client, _) = app.client().await;
        let (tech, tech_profile) = app.technician().await;
        let mut body = ticket_body();
        body["technician_id"] = json!(tech_profile.id);

        let response = app.post("/api/tickets", Some(client.id), body).await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.json["technician"]["full_name"], "Paul Martin");
        let admin_notes = app
            .state
            .notifications
            .list_notifications(admin.id, false)
            .await
            .unwrap();
        assert_eq!(admin_notes.len(), 1);
        assert_eq!(admin_notes[0].title, TICKET_CREATED_TITLE);
        assert_eq!(
            admin_notes[0].message,
            "Le ticket 'Printer jam' a été créé par Jane Doe."
        );
        let tech_notes = app
            .state
            .notifications
            .list_notifications(tech.id, false)
            .await
            .unwrap();
        assert_eq!(tech_notes.len(), 1);
        assert_eq!(tech_notes[0].title, TICKET_ASSIGNED_TITLE);
        assert_eq!(
            tech_notes[0].message,
            "Le ticket 'Printer jam' vous a été assigné. Priorité: High."
        );
    }

    #[tokio::test]
    async fn test_unknown_technician_is_rejected() {
        let app = TestApp::new();
        let (client, _) = app.client().await;
        let mut body = ticket_body();
        body["technician_id"] = json!(uuid::Uuid::new_v4());

        let response = app.post("/api/tickets", Some(client.id), body).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_filtered() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (client_a, profile_a) = app.client().await;
        let (_, profile_b) = app.client().await;
        let (tech, tech_profile) = app.technician().await;
        app.ticket(&profile_a, Some(&tech_profile), TicketStatus::Open).await;
        app.ticket(&profile_a, None, TicketStatus::Closed).await;
        app.ticket(&profile_b, None, TicketStatus::Open).await;

        let all = app.get("/api/tickets", Some(admin.id)).await;
        let own = app.get("/api/tickets", Some(client_a.id)).await;
        let assigned = app.get("/api/tickets", Some(tech.id)).await;
        let closed = app.get("/api/tickets?status=closed", Some(admin.id)).await;

        assert_eq!(all.json.as_array().unwrap().len(), 3);
        assert_eq!(own.json.as_array().unwrap().len(), 2);
        assert_eq!(assigned.json.as_array().unwrap().len(), 1);
        assert_eq!(closed.json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ticket_outside_scope_is_404() {
        let app = TestApp::new();
        let (_, profile_a) = app.client().await;
        let (client_b, _) = app.client().await;
        let ticket = app.ticket(&profile_a, None, TicketStatus::Open).await;

        let response = app
            .get(&format!("/api/tickets/{}", ticket.id), Some(client_b.id))
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_keeps_code_and_notifies_new_assignee() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (_, profile) = app.client().await;
        let (tech, tech_profile) = app.technician().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        let uri = format!("/api/tickets/{}", ticket.id);

        let assigned = app
            .put(
                &uri,
                Some(admin.id),
                json!({"technician_id": tech_profile.id, "status": "in_progress", "code": "HACK"}),
            )
            .await;
        let resaved = app
            .put(&uri, Some(admin.id), json!({"technician_id": tech_profile.id}))
            .await;

        assert_eq!(assigned.status, StatusCode::OK);
        assert_eq!(assigned.json["code"], ticket.code);
        assert_eq!(assigned.json["status_display"], "En cours");
        assert_eq!(resaved.status, StatusCode::OK);
        let notes = app
            .state
            .notifications
            .list_notifications(tech.id, false)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_update_can_unassign() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (_, profile) = app.client().await;
        let (_, tech_profile) = app.technician().await;
        let ticket = app
            .ticket(&profile, Some(&tech_profile), TicketStatus::Open)
            .await;

        let response = app
            .put(
                &format!("/api/tickets/{}", ticket.id),
                Some(admin.id),
                json!({"technician_id": null}),
            )
            .await;

        assert_eq!(response.json["technician_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_delete_cascades_messages() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (client, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        app.state
            .messages
            .create_message(&Message::new(ticket.id, client.id).with_content("Hi"))
            .await
            .unwrap();

        let response = app
            .delete(&format!("/api/tickets/{}", ticket.id), Some(admin.id))
            .await;

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(app.state.messages.list_messages(ticket.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messages_are_oldest_first_with_authors() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let (tech, tech_profile) = app.technician().await;
        let ticket = app
            .ticket(&profile, Some(&tech_profile), TicketStatus::Open)
            .await;
        let mut first = Message::new(ticket.id, client.id).with_content("It broke");
        first.timestamp = Utc::now() - chrono::Duration::minutes(5);
        let second = Message::new(ticket.id, tech.id).with_content("On my way");
        for message in [&second, &first] {
            app.state.messages.create_message(message).await.unwrap();
        }

        let response = app
            .get(&format!("/api/tickets/{}/messages", ticket.id), Some(client.id))
            .await;

        let messages = response.json.as_array().unwrap();
        assert_eq!(messages[0]["content"], "It broke");
        assert_eq!(messages[0]["is_own_message"], true);
        assert_eq!(messages[1]["user_name"], "Paul Martin");
        assert_eq!(messages[1]["user_type"], "technician");
        assert_eq!(messages[1]["is_own_message"], false);
    }
}
