//! Intervention handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use helpdesk_core::interventions::{
    generate_intervention_code, recompute_totals, sort_interventions, validate_intervention,
    Intervention,
};

use super::error::{json_body, not_found};
use super::AppError;
use crate::models::{
    CreateIntervention, InterventionView, ListInterventionsQuery, UpdateIntervention,
};
use crate::state::AppState;

async fn load_intervention(state: &AppState, id: Uuid) -> Result<Intervention, AppError> {
    state
        .interventions
        .get_intervention(id)
        .await?
        .ok_or_else(|| not_found("Intervention"))
}

async fn ensure_technician_exists(state: &AppState, id: Option<Uuid>) -> Result<(), AppError> {
    let Some(id) = id else {
        return Ok(());
    };
    state
        .users
        .get_technician(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found("Technician"))
}

/// List interventions (GET /api/interventions?ticket={id}).
pub async fn list_interventions(
    State(state): State<AppState>,
    Query(query): Query<ListInterventionsQuery>,
) -> Result<Json<Vec<InterventionView>>, AppError> {
    let mut interventions = state.interventions.list_interventions(query.ticket).await?;
    sort_interventions(&mut interventions);

    Ok(Json(
        interventions
            .into_iter()
            .map(|intervention| InterventionView::new(intervention, &state.media))
            .collect(),
    ))
}

/// Log an intervention against a ticket (POST /api/interventions).
pub async fn create_intervention(
    State(state): State<AppState>,
    payload: Result<Json<CreateIntervention>, JsonRejection>,
) -> Result<(StatusCode, Json<InterventionView>), AppError> {
    let mut intervention = json_body(payload)?.into_intervention();
    validate_intervention(&intervention)?;
    recompute_totals(&mut intervention)?;

    state
        .tickets
        .get_ticket(intervention.ticket_id)
        .await?
        .ok_or_else(|| not_found("Ticket"))?;
    ensure_technician_exists(&state, intervention.technician_id).await?;

    intervention.code = generate_intervention_code();
    state.interventions.create_intervention(&intervention).await?;

    tracing::info!(
        intervention_id = %intervention.id,
        code = %intervention.code,
        ticket_id = %intervention.ticket_id,
        "Created intervention"
    );

    Ok((
        StatusCode::CREATED,
        Json(InterventionView::new(intervention, &state.media)),
    ))
}

/// Get an intervention (GET /api/interventions/{id}).
pub async fn get_intervention(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterventionView>, AppError> {
    let intervention = load_intervention(&state, id).await?;

    Ok(Json(InterventionView::new(intervention, &state.media)))
}

/// Partially update an intervention (PUT/PATCH /api/interventions/{id}).
pub async fn update_intervention(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateIntervention>, JsonRejection>,
) -> Result<Json<InterventionView>, AppError> {
    let payload = json_body(payload)?;
    let mut intervention = load_intervention(&state, id).await?;
    let previous_technician = intervention.technician_id;

    payload.apply_to(&mut intervention);
    validate_intervention(&intervention)?;
    recompute_totals(&mut intervention)?;
    if intervention.technician_id != previous_technician {
        ensure_technician_exists(&state, intervention.technician_id).await?;
    }

    state.interventions.update_intervention(&intervention).await?;

    tracing::info!(intervention_id = %id, status = %intervention.status.as_str(), "Updated intervention");

    Ok(Json(InterventionView::new(intervention, &state.media)))
}

/// Delete an intervention (DELETE /api/interventions/{id}).
pub async fn delete_intervention(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.interventions.delete_intervention(id).await?;

    tracing::info!(intervention_id = %id, "Deleted intervention");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use helpdesk_core::interventions::Intervention;
    use helpdesk_core::tickets::TicketStatus;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_create_assigns_code_and_totals() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let (_, tech) = app.technician().await;
        let ticket = app.ticket(&profile, Some(&tech), TicketStatus::InProgress).await;

        let response = app
            .post(
                "/api/interventions",
                None,
                json!({
                    "ticket_id": ticket.id,
                    "technician_id": tech.id,
                    "report": "Replaced the fuser",
                    "transport_cost": "15.50",
                    "additional_costs": "4.50",
                    "hours_worked": "2",
                    "travel_time": "0.5",
                    "materials": [{"name": "Fuser", "quantity": "2", "unit_cost": "30"}],
                    "images": [{"image": "interventions/fuser.png"}]
                }),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED);
        let code = response.json["code"].as_str().unwrap();
        assert!(code.starts_with("INT-"));
        assert_eq!(code.len(), 12);
        assert_eq!(response.json["total_cost"], "20.00");
        assert_eq!(response.json["total_time"], "2.5");
        assert_eq!(response.json["materials"][0]["total_cost"], "60");
        assert_eq!(response.json["status_display"], "Planifiée");
        assert_eq!(response.json["status_color"], "blue");
        let image = &response.json["images"][0];
        assert_eq!(image["file_extension"], ".png");
        assert!(image["thumbnail_url"]
            .as_str()
            .unwrap()
            .contains("/image/upload/"));
    }

    #[tokio::test]
    async fn test_create_requires_existing_ticket_and_technician() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let no_ticket = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": uuid::Uuid::new_v4(), "report": "x"}),
            )
            .await;
        let no_tech = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "technician_id": uuid::Uuid::new_v4(), "report": "x"}),
            )
            .await;

        assert_eq!(no_ticket.status, StatusCode::NOT_FOUND);
        assert_eq!(no_tech.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_validates_times_and_amounts() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let bad_times = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "report": "x", "start_time": "10:00:00", "end_time": "09:00:00"}),
            )
            .await;
        let negative = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "report": "x", "transport_cost": "-1"}),
            )
            .await;
        let empty = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "report": "  "}),
            )
            .await;

        assert_eq!(bad_times.status, StatusCode::BAD_REQUEST);
        assert_eq!(negative.status, StatusCode::BAD_REQUEST);
        assert_eq!(negative.json["error"], "transport_cost cannot be negative");
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_amounts_beyond_precision() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;

        let huge = app
            .post(
                "/api/interventions",
                None,
                json!({
                    "ticket_id": ticket.id,
                    "report": "x",
                    "transport_cost": "79228162514264337593543950335",
                    "additional_costs": "1"
                }),
            )
            .await;
        let huge_material = app
            .post(
                "/api/interventions",
                None,
                json!({
                    "ticket_id": ticket.id,
                    "report": "x",
                    "materials": [{
                        "name": "Bulk",
                        "quantity": "79228162514264337593543950335",
                        "unit_cost": "2"
                    }]
                }),
            )
            .await;
        let fractional = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "report": "x", "transport_cost": "10.125", "additional_costs": "0.001"}),
            )
            .await;
        let fractional_expense = app
            .post(
                "/api/interventions",
                None,
                json!({
                    "ticket_id": ticket.id,
                    "report": "x",
                    "expenses": [{"expense_type": "parking", "amount": "3.333"}]
                }),
            )
            .await;
        let listed = app
            .get(&format!("/api/interventions?ticket={}", ticket.id), None)
            .await;

        assert_eq!(huge.status, StatusCode::BAD_REQUEST);
        assert_eq!(huge.json["error"], "transport_cost has too many digits");
        assert_eq!(huge_material.status, StatusCode::BAD_REQUEST);
        assert_eq!(fractional.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            fractional.json["error"],
            "transport_cost cannot have more than 2 decimal places"
        );
        assert_eq!(fractional_expense.status, StatusCode::BAD_REQUEST);
        assert!(listed.json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_oversized_total() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        let created = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "report": "Visit", "transport_cost": "99999999.99"}),
            )
            .await;
        let uri = format!("/api/interventions/{}", created.json["id"].as_str().unwrap());

        let overflow = app.put(&uri, None, json!({"additional_costs": "0.01"})).await;
        let reread = app.get(&uri, None).await;

        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(overflow.status, StatusCode::BAD_REQUEST);
        assert_eq!(overflow.json["error"], "total_cost has too many digits");
        assert_eq!(reread.json["total_cost"], "99999999.99");
    }

    #[tokio::test]
    async fn test_update_recomputes_totals_and_keeps_code() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        let created = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket.id, "report": "Visit", "transport_cost": "10"}),
            )
            .await;
        let id = created.json["id"].as_str().unwrap();

        let updated = app
            .put(
                &format!("/api/interventions/{id}"),
                None,
                json!({"additional_costs": "5", "status": "completed", "code": "INT-HACKED00"}),
            )
            .await;

        assert_eq!(updated.status, StatusCode::OK);
        assert_eq!(updated.json["code"], created.json["code"]);
        assert_eq!(updated.json["total_cost"], "15");
        assert_eq!(updated.json["status_display"], "Terminée");
    }

    #[tokio::test]
    async fn test_list_filters_by_ticket_newest_first() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        let other = app.ticket(&profile, None, TicketStatus::Open).await;
        let older = Intervention::new(ticket.id, "First visit")
            .with_date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
            .with_costs(Decimal::ZERO, Decimal::ZERO);
        let newer = Intervention::new(ticket.id, "Second visit")
            .with_date(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        let elsewhere = Intervention::new(other.id, "Elsewhere");
        for intervention in [&older, &newer, &elsewhere] {
            app.state
                .interventions
                .create_intervention(intervention)
                .await
                .unwrap();
        }

        let response = app
            .get(&format!("/api/interventions?ticket={}", ticket.id), None)
            .await;
        let all = app.get("/api/interventions", None).await;

        let reports: Vec<_> = response
            .json
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["report"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(reports, vec!["Second visit", "First visit"]);
        assert_eq!(all.json.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_404() {
        let app = TestApp::new();
        let (_, profile) = app.client().await;
        let ticket = app.ticket(&profile, None, TicketStatus::Open).await;
        let intervention = Intervention::new(ticket.id, "Visit");
        app.state
            .interventions
            .create_intervention(&intervention)
            .await
            .unwrap();
        let uri = format!("/api/interventions/{}", intervention.id);

        let deleted = app.delete(&uri, None).await;
        let missing = app.get(&uri, None).await;

        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }
}
