//! Rating handlers.
//!
//! Clients rate technicians and technicians rate clients, once per pair,
//! and only after a closed ticket between them.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use helpdesk_core::accounts::Profile;
use helpdesk_core::ratings::{
    rater_client_id, rater_technician_id, shares_closed_ticket, validate_score, ClientRating,
    RatingError, TechnicianRating,
};
use helpdesk_core::storage::{RepositoryError, TicketFilter};
use helpdesk_core::tickets::{TicketScope, TicketStatus};

use super::error::{json_body, not_found};
use super::{Actor, AppError};
use crate::models::{CreateRating, RatingsView, ReceivedRatings};
use crate::state::AppState;

/// Whether `client_id` and `technician_id` worked together on a closed ticket.
async fn worked_together(
    state: &AppState,
    client_id: Uuid,
    technician_id: Uuid,
) -> Result<bool, AppError> {
    let filter = TicketFilter::scoped(TicketScope::Client(client_id)).with_status(TicketStatus::Closed);
    let closed = state.tickets.list_tickets(&filter).await?;
    Ok(shares_closed_ticket(&closed, client_id, technician_id))
}

/// Turns a duplicate insert into the matching rating error.
fn already_rated(err: RepositoryError, rated: RatingError) -> AppError {
    match err {
        RepositoryError::AlreadyExists { .. } => rated.into(),
        other => other.into(),
    }
}

/// Ratings a technician received (GET /api/technicians/{id}/ratings).
pub async fn list_technician_ratings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingsView<TechnicianRating>>, AppError> {
    state
        .users
        .get_technician(id)
        .await?
        .ok_or_else(|| not_found("Technician"))?;
    let ratings = state.ratings.list_technician_ratings(id).await?;

    Ok(Json(RatingsView::new(ratings, |r| r.rating)))
}

/// A client rates a technician (POST /api/technicians/{id}/ratings).
pub async fn rate_technician(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateRating>, JsonRejection>,
) -> Result<(StatusCode, Json<TechnicianRating>), AppError> {
    let client_id = rater_client_id(actor.user_type(), actor.profile.as_ref())?;
    let payload = json_body(payload)?;
    validate_score(payload.rating)?;

    state
        .users
        .get_technician(id)
        .await?
        .ok_or_else(|| not_found("Technician"))?;
    if !worked_together(&state, client_id, id).await? {
        return Err(RatingError::NoClosedTicketWithTechnician.into());
    }

    let rating = TechnicianRating::new(id, client_id, payload.rating, payload.comment);
    state
        .ratings
        .create_technician_rating(&rating)
        .await
        .map_err(|e| already_rated(e, RatingError::AlreadyRatedTechnician))?;

    tracing::info!(technician_id = %id, client_id = %client_id, rating = rating.rating, "Rated technician");

    Ok((StatusCode::CREATED, Json(rating)))
}

/// Ratings a client received (GET /api/clients/{id}/ratings).
pub async fn list_client_ratings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingsView<ClientRating>>, AppError> {
    state
        .users
        .get_client(id)
        .await?
        .ok_or_else(|| not_found("Client"))?;
    let ratings = state.ratings.list_client_ratings(id).await?;

    Ok(Json(RatingsView::new(ratings, |r| r.rating)))
}

/// A technician rates a client (POST /api/clients/{id}/ratings).
pub async fn rate_client(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateRating>, JsonRejection>,
) -> Result<(StatusCode, Json<ClientRating>), AppError> {
    let technician_id = rater_technician_id(actor.user_type(), actor.profile.as_ref())?;
    let payload = json_body(payload)?;
    validate_score(payload.rating)?;

    state
        .users
        .get_client(id)
        .await?
        .ok_or_else(|| not_found("Client"))?;
    if !worked_together(&state, id, technician_id).await? {
        return Err(RatingError::NoClosedTicketWithClient.into());
    }

    let rating = ClientRating::new(id, technician_id, payload.rating, payload.comment);
    state
        .ratings
        .create_client_rating(&rating)
        .await
        .map_err(|e| already_rated(e, RatingError::AlreadyRatedClient))?;

    tracing::info!(client_id = %id, technician_id = %technician_id, rating = rating.rating, "Rated client");

    Ok((StatusCode::CREATED, Json(rating)))
}

/// Ratings received by the actor's own profile (GET /api/ratings/me).
pub async fn my_ratings(
    actor: Actor,
    State(state): State<AppState>,
) -> Result<Json<ReceivedRatings>, AppError> {
    let received = match actor.profile {
        Some(Profile::Client(client)) if !actor.user.is_admin() => {
            let ratings = state.ratings.list_client_ratings(client.id).await?;
            ReceivedRatings::Client(RatingsView::new(ratings, |r| r.rating))
        }
        Some(Profile::Technician(technician)) if !actor.user.is_admin() => {
            let ratings = state.ratings.list_technician_ratings(technician.id).await?;
            ReceivedRatings::Technician(RatingsView::new(ratings, |r| r.rating))
        }
        _ => ReceivedRatings::Nothing(Default::default()),
    };

    Ok(Json(received))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use helpdesk_core::tickets::TicketStatus;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_client_rates_technician_once() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let (_, tech) = app.technician().await;
        app.ticket(&profile, Some(&tech), TicketStatus::Closed).await;
        let uri = format!("/api/technicians/{}/ratings", tech.id);

        let first = app
            .post(&uri, Some(client.id), json!({"rating": 5, "comment": "Quick fix"}))
            .await;
        let second = app.post(&uri, Some(client.id), json!({"rating": 4})).await;
        let listed = app.get(&uri, None).await;

        assert_eq!(first.status, StatusCode::CREATED);
        assert_eq!(first.json["client_id"], profile.id.to_string());
        assert_eq!(second.status, StatusCode::BAD_REQUEST);
        assert_eq!(second.json["error"], "You have already rated this technician");
        assert_eq!(listed.json["total_ratings"], 1);
        assert_eq!(listed.json["average_rating"], 5.0);
    }

    #[tokio::test]
    async fn test_rating_requires_closed_ticket() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let (_, tech) = app.technician().await;
        app.ticket(&profile, Some(&tech), TicketStatus::Resolved).await;

        let response = app
            .post(
                &format!("/api/technicians/{}/ratings", tech.id),
                Some(client.id),
                json!({"rating": 5}),
            )
            .await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_only_clients_rate_technicians() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (_, tech) = app.technician().await;

        let response = app
            .post(
                &format!("/api/technicians/{}/ratings", tech.id),
                Some(admin.id),
                json!({"rating": 5}),
            )
            .await;

        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.json["error"], "Only clients can rate technicians");
    }

    #[tokio::test]
    async fn test_score_out_of_range_is_rejected() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let (_, tech) = app.technician().await;
        app.ticket(&profile, Some(&tech), TicketStatus::Closed).await;

        let response = app
            .post(
                &format!("/api/technicians/{}/ratings", tech.id),
                Some(client.id),
                json!({"rating": 6}),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_technician_rates_client_and_reads_own_ratings() {
        let app = TestApp::new();
        let (client, profile) = app.client().await;
        let (tech_user, tech) = app.technician().await;
        app.ticket(&profile, Some(&tech), TicketStatus::Closed).await;

        let rated = app
            .post(
                &format!("/api/clients/{}/ratings", profile.id),
                Some(tech_user.id),
                json!({"rating": 3}),
            )
            .await;
        let client_me = app.get("/api/ratings/me", Some(client.id)).await;
        let tech_me = app.get("/api/ratings/me", Some(tech_user.id)).await;

        assert_eq!(rated.status, StatusCode::CREATED);
        assert_eq!(client_me.json["total_ratings"], 1);
        assert_eq!(client_me.json["ratings"][0]["rating"], 3);
        assert_eq!(tech_me.json["total_ratings"], 0);
    }

    #[tokio::test]
    async fn test_admin_ratings_me_is_empty_object() {
        let app = TestApp::new();
        let admin = app.admin().await;

        let response = app.get("/api/ratings/me", Some(admin.id)).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json, json!({}));
    }

    #[tokio::test]
    async fn test_unknown_technician_ratings_is_404() {
        let app = TestApp::new();

        let response = app
            .get(&format!("/api/technicians/{}/ratings", uuid::Uuid::new_v4()), None)
            .await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
