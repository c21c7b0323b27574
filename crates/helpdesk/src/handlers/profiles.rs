//! Client and technician profile handlers.
//!
//! Profiles are created together with their account. Deleting a profile
//! keeps the account: a client's tickets go with it, a technician's
//! assignments are cleared.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use helpdesk_core::accounts::{
    normalize_company, validate_user, AccountError, ClientProfile, Profile, TechnicianProfile,
    UserType,
};
use helpdesk_core::ratings::summarize;

use super::error::{json_body, not_found};
use super::AppError;
use crate::models::{
    ClientView, CreateClient, CreateTechnician, TechnicianView, UpdateClient, UpdateTechnician,
    UserView,
};
use crate::state::AppState;

async fn client_view(state: &AppState, client: ClientProfile) -> Result<ClientView, AppError> {
    let user = state
        .users
        .get_user(client.user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;
    let scores: Vec<u8> = state
        .ratings
        .list_client_ratings(client.id)
        .await?
        .iter()
        .map(|r| r.rating)
        .collect();

    Ok(ClientView::new(
        client,
        UserView::new(user, &state.media),
        summarize(&scores),
    ))
}

async fn technician_view(
    state: &AppState,
    technician: TechnicianProfile,
) -> Result<TechnicianView, AppError> {
    let user = state
        .users
        .get_user(technician.user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;
    let scores: Vec<u8> = state
        .ratings
        .list_technician_ratings(technician.id)
        .await?
        .iter()
        .map(|r| r.rating)
        .collect();

    Ok(TechnicianView::new(
        technician,
        UserView::new(user, &state.media),
        summarize(&scores),
    ))
}

// ============================================================================
// Clients
// ============================================================================

/// List clients (GET /api/clients).
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientView>>, AppError> {
    let clients = state.users.list_clients().await?;

    let mut views = Vec::with_capacity(clients.len());
    for client in clients {
        views.push(client_view(&state, client).await?);
    }
    Ok(Json(views))
}

/// Create a client account (POST /api/clients).
pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<CreateClient>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientView>), AppError> {
    let CreateClient { mut user, company } = json_body(payload)?;
    user.user_type = UserType::Client;
    user.is_superuser = false;

    let company = normalize_company(&company)?;
    let user = user.into_user();
    validate_user(&user)?;

    let client = ClientProfile::new(user.id, company);
    state
        .users
        .create_user(&user, Some(&Profile::Client(client.clone())))
        .await?;

    tracing::info!(client_id = %client.id, user_id = %user.id, "Created client");

    Ok((StatusCode::CREATED, Json(client_view(&state, client).await?)))
}

/// Get a client (GET /api/clients/{id}).
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClientView>, AppError> {
    let client = state
        .users
        .get_client(id)
        .await?
        .ok_or_else(|| not_found("Client"))?;

    Ok(Json(client_view(&state, client).await?))
}

/// Update a client and its account (PUT/PATCH /api/clients/{id}).
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateClient>, JsonRejection>,
) -> Result<Json<ClientView>, AppError> {
    let UpdateClient { company, user: mut update } = json_body(payload)?;
    // The profile kind follows the account role.
    update.user_type = None;
    update.is_superuser = None;

    let mut client = state
        .users
        .get_client(id)
        .await?
        .ok_or_else(|| not_found("Client"))?;
    let mut user = state
        .users
        .get_user(client.user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;

    if let Some(company) = company {
        client.company = normalize_company(&company)?;
    }
    update.apply_to(&mut user);
    validate_user(&user)?;

    state.users.update_user(&user).await?;
    state.users.update_client(&client).await?;

    tracing::info!(client_id = %id, "Updated client");

    Ok(Json(client_view(&state, client).await?))
}

/// Delete a client profile and its tickets (DELETE /api/clients/{id}).
pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.users.delete_client(id).await?;

    tracing::info!(client_id = %id, "Deleted client");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Technicians
// ============================================================================

/// List technicians (GET /api/technicians).
pub async fn list_technicians(
    State(state): State<AppState>,
) -> Result<Json<Vec<TechnicianView>>, AppError> {
    let technicians = state.users.list_technicians().await?;

    let mut views = Vec::with_capacity(technicians.len());
    for technician in technicians {
        views.push(technician_view(&state, technician).await?);
    }
    Ok(Json(views))
}

/// Create a technician account (POST /api/technicians).
pub async fn create_technician(
    State(state): State<AppState>,
    payload: Result<Json<CreateTechnician>, JsonRejection>,
) -> Result<(StatusCode, Json<TechnicianView>), AppError> {
    let CreateTechnician {
        mut user,
        specialty,
    } = json_body(payload)?;
    let specialty = specialty.ok_or(AccountError::MissingSpecialty)?;
    user.user_type = UserType::Technician;
    user.is_superuser = false;

    let user = user.into_user();
    validate_user(&user)?;

    let technician = TechnicianProfile::new(user.id, Some(specialty));
    state
        .users
        .create_user(&user, Some(&Profile::Technician(technician.clone())))
        .await?;

    tracing::info!(technician_id = %technician.id, user_id = %user.id, "Created technician");

    Ok((
        StatusCode::CREATED,
        Json(technician_view(&state, technician).await?),
    ))
}

/// Get a technician (GET /api/technicians/{id}).
pub async fn get_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TechnicianView>, AppError> {
    let technician = state
        .users
        .get_technician(id)
        .await?
        .ok_or_else(|| not_found("Technician"))?;

    Ok(Json(technician_view(&state, technician).await?))
}

/// Update a technician and its account (PUT/PATCH /api/technicians/{id}).
pub async fn update_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTechnician>, JsonRejection>,
) -> Result<Json<TechnicianView>, AppError> {
    let UpdateTechnician {
        specialty,
        user: mut update,
    } = json_body(payload)?;
    update.user_type = None;
    update.is_superuser = None;

    let mut technician = state
        .users
        .get_technician(id)
        .await?
        .ok_or_else(|| not_found("Technician"))?;
    let mut user = state
        .users
        .get_user(technician.user_id)
        .await?
        .ok_or_else(|| not_found("User"))?;

    if let Some(specialty) = specialty {
        technician.specialty = Some(specialty);
    }
    update.apply_to(&mut user);
    validate_user(&user)?;

    state.users.update_user(&user).await?;
    state.users.update_technician(&technician).await?;

    tracing::info!(technician_id = %id, "Updated technician");

    Ok(Json(technician_view(&state, technician).await?))
}

/// Delete a technician profile (DELETE /api/technicians/{id}).
///
/// Tickets and interventions assigned to it become unassigned.
pub async fn delete_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.users.delete_technician(id).await?;

    tracing::info!(technician_id = %id, "Deleted technician");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use helpdesk_core::interventions::Intervention;
    use helpdesk_core::ratings::TechnicianRating;
    use helpdesk_core::tickets::TicketStatus;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_create_client_forces_role_and_trims_company() {
        let app = TestApp::new();

        let response = app
            .post(
                "/api/clients",
                None,
                json!({"username": "acme", "email": "it@acme.test", "user_type": "admin",
                       "company": "  Acme Corp  "}),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.json["company"], "Acme Corp");
        assert_eq!(response.json["user"]["user_type"], "client");
        assert_eq!(response.json["total_ratings"], 0);
    }

    #[tokio::test]
    async fn test_create_client_requires_company() {
        let app = TestApp::new();

        let response = app
            .post(
                "/api/clients",
                None,
                json!({"username": "acme", "email": "it@acme.test", "company": "   "}),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], "Company is required for clients.");
    }

    #[tokio::test]
    async fn test_create_technician_requires_specialty() {
        let app = TestApp::new();

        let missing = app
            .post(
                "/api/technicians",
                None,
                json!({"username": "t", "email": "t@example.com"}),
            )
            .await;
        let created = app
            .post(
                "/api/technicians",
                None,
                json!({"username": "t", "email": "t@example.com", "specialty": "security"}),
            )
            .await;

        assert_eq!(missing.status, StatusCode::BAD_REQUEST);
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.json["specialty"], "security");
        assert_eq!(created.json["user"]["user_type"], "technician");
    }

    #[tokio::test]
    async fn test_technician_view_carries_rating_summary() {
        let app = TestApp::new();
        let (_, technician) = app.technician().await;
        let (_, client_a) = app.client().await;
        let (_, client_b) = app.client().await;
        for (client, score) in [(&client_a, 3), (&client_b, 4)] {
            app.state
                .ratings
                .create_technician_rating(&TechnicianRating::new(
                    technician.id,
                    client.id,
                    score,
                    None,
                ))
                .await
                .unwrap();
        }

        let response = app
            .get(&format!("/api/technicians/{}", technician.id), None)
            .await;

        assert_eq!(response.json["total_ratings"], 2);
        assert_eq!(response.json["average_rating"], 3.5);
    }

    #[tokio::test]
    async fn test_update_client_company_and_user() {
        let app = TestApp::new();
        let (_, client) = app.client().await;

        let response = app
            .put(
                &format!("/api/clients/{}", client.id),
                None,
                json!({"company": "Globex", "last_name": "Smith"}),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json["company"], "Globex");
        assert_eq!(response.json["user"]["full_name"], "Jane Smith");
    }

    #[tokio::test]
    async fn test_delete_client_removes_its_tickets() {
        let app = TestApp::new();
        let (user, client) = app.client().await;
        let ticket = app.ticket(&client, None, TicketStatus::Open).await;

        let response = app.delete(&format!("/api/clients/{}", client.id), None).await;

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        assert!(app.state.tickets.get_ticket(ticket.id).await.unwrap().is_none());
        assert!(app.state.users.get_user(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_technician_unassigns_work() {
        let app = TestApp::new();
        let (_, client) = app.client().await;
        let (_, technician) = app.technician().await;
        let ticket = app
            .ticket(&client, Some(&technician), TicketStatus::InProgress)
            .await;
        let intervention = Intervention::new(ticket.id, "Checked cabling").with_technician(technician.id);
        app.state
            .interventions
            .create_intervention(&intervention)
            .await
            .unwrap();

        let response = app
            .delete(&format!("/api/technicians/{}", technician.id), None)
            .await;

        assert_eq!(response.status, StatusCode::NO_CONTENT);
        let ticket = app.state.tickets.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(ticket.technician_id, None);
        let intervention = app
            .state
            .interventions
            .get_intervention(intervention.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(intervention.technician_id, None);
    }

    #[tokio::test]
    async fn test_unknown_profiles_are_404() {
        let app = TestApp::new();
        let id = uuid::Uuid::new_v4();

        let client = app.get(&format!("/api/clients/{id}"), None).await;
        let technician = app.delete(&format!("/api/technicians/{id}"), None).await;

        assert_eq!(client.status, StatusCode::NOT_FOUND);
        assert_eq!(technician.status, StatusCode::NOT_FOUND);
    }
}
