use axum::{
    http::{header, HeaderName, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        actor::ACTOR_HEADER,
        exports::{export_tickets_pdf, intervention_report, monthly_report},
        health::{healthz, livez},
        interventions::{
            create_intervention, delete_intervention, get_intervention, list_interventions,
            update_intervention,
        },
        messages::create_message,
        notifications::{list_notifications, mark_all_read, mark_read, unread_count},
        procedures::{
            add_attachment, add_image, create_procedure, delete_procedure, download_attachment,
            get_procedure, get_procedure_by_slug, list_procedures, list_tags, record_interaction,
            update_procedure,
        },
        profiles::{
            create_client, create_technician, delete_client, delete_technician, get_client,
            get_technician, list_clients, list_technicians, update_client, update_technician,
        },
        ratings::{
            list_client_ratings, list_technician_ratings, my_ratings, rate_client,
            rate_technician,
        },
        tickets::{
            create_ticket, delete_ticket, get_ticket, list_ticket_interventions,
            list_ticket_messages, list_tickets, update_ticket,
        },
        users::{create_user, delete_user, get_user, list_users, me, update_user},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration for API endpoints
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)]);

    let api_routes = Router::new()
        // Accounts
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(me))
        .route(
            "/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{id}",
            get(get_client)
                .put(update_client)
                .patch(update_client)
                .delete(delete_client),
        )
        .route(
            "/clients/{id}/ratings",
            get(list_client_ratings).post(rate_client),
        )
        .route("/technicians", get(list_technicians).post(create_technician))
        .route(
            "/technicians/{id}",
            get(get_technician)
                .put(update_technician)
                .patch(update_technician)
                .delete(delete_technician),
        )
        .route(
            "/technicians/{id}/ratings",
            get(list_technician_ratings).post(rate_technician),
        )
        .route("/ratings/me", get(my_ratings))
        // Tickets
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/export/pdf", get(export_tickets_pdf))
        .route(
            "/tickets/{id}",
            get(get_ticket)
                .put(update_ticket)
                .patch(update_ticket)
                .delete(delete_ticket),
        )
        .route("/tickets/{id}/interventions", get(list_ticket_interventions))
        .route("/tickets/{id}/messages", get(list_ticket_messages))
        // Interventions
        .route(
            "/interventions",
            get(list_interventions).post(create_intervention),
        )
        .route(
            "/interventions/{id}",
            get(get_intervention)
                .put(update_intervention)
                .patch(update_intervention)
                .delete(delete_intervention),
        )
        .route("/interventions/{id}/report", get(intervention_report))
        .route("/reports/monthly", get(monthly_report))
        // Conversation
        .route("/messages", post(create_message))
        // Knowledge base
        .route("/procedures", get(list_procedures).post(create_procedure))
        .route("/procedures/slug/{slug}", get(get_procedure_by_slug))
        .route(
            "/procedures/{id}",
            get(get_procedure)
                .put(update_procedure)
                .patch(update_procedure)
                .delete(delete_procedure),
        )
        .route("/procedures/{id}/interactions", post(record_interaction))
        .route("/procedures/{id}/images", post(add_image))
        .route("/procedures/{id}/attachments", post(add_attachment))
        .route(
            "/procedures/{id}/attachments/{attachment_id}/download",
            post(download_attachment),
        )
        .route("/procedure-tags", get(list_tags))
        // Notifications
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/{id}/read", post(mark_read))
        .layer(cors);

    let timeout = state.request_timeout;

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = TestApp::new();

        let response = app.get("/api/nowhere", None).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let app = TestApp::new();
        let admin = app.admin().await;

        let response = app.get("/api/tickets/not-a-uuid", Some(admin.id)).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_json_is_400_with_error_body() {
        let app = TestApp::new();

        let response = app.post("/api/users", None, json!({"username": 42})).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.json["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_patch_is_routed_like_put() {
        let app = TestApp::new();
        let (client, _) = app.client().await;

        let response = app
            .request(
                axum::http::Method::PATCH,
                &format!("/api/users/{}", client.id),
                Some(client.id),
                Some(json!({"last_name": "Smith"})),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json["full_name"], "Jane Smith");
    }

    #[tokio::test]
    async fn test_full_ticket_flow() {
        let app = TestApp::new();
        let admin = app.admin().await;
        let (client, profile) = app.client().await;
        let (tech_user, tech) = app.technician().await;

        let ticket = app
            .post(
                "/api/tickets",
                Some(client.id),
                json!({"title": "No network", "description": "Office is offline"}),
            )
            .await;
        let ticket_id = ticket.json["id"].as_str().unwrap().to_string();
        app.put(
            &format!("/api/tickets/{ticket_id}"),
            Some(admin.id),
            json!({"technician_id": tech.id}),
        )
        .await;
        let intervention = app
            .post(
                "/api/interventions",
                None,
                json!({"ticket_id": ticket_id, "technician_id": tech.id, "report": "Swapped switch"}),
            )
            .await;
        let note = app
            .post(
                "/api/messages",
                Some(tech_user.id),
                json!({"ticket_id": ticket_id, "content": "Fixed"}),
            )
            .await;
        app.put(
            &format!("/api/tickets/{ticket_id}"),
            Some(tech_user.id),
            json!({"status": "closed"}),
        )
        .await;
        let rating = app
            .post(
                &format!("/api/technicians/{}/ratings", tech.id),
                Some(client.id),
                json!({"rating": 4}),
            )
            .await;
        let history = app
            .get(&format!("/api/tickets/{ticket_id}/interventions"), Some(client.id))
            .await;
        let tech_unread = app
            .get("/api/notifications/unread-count", Some(tech_user.id))
            .await;

        assert_eq!(ticket.status, StatusCode::CREATED);
        assert_eq!(ticket.json["client"]["id"], profile.id.to_string());
        assert_eq!(intervention.status, StatusCode::CREATED);
        assert_eq!(note.status, StatusCode::CREATED);
        assert_eq!(rating.status, StatusCode::CREATED);
        assert_eq!(history.json.as_array().unwrap().len(), 1);
        assert_eq!(tech_unread.json["unread_count"], 1);
    }
}
