//! Router-level helpers shared by the handler tests.

use std::sync::atomic::{AtomicU32, Ordering};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, Profile, Specialty, TechnicianProfile, User, UserType};
use helpdesk_core::tickets::{Ticket, TicketStatus};

use super::actor::ACTOR_HEADER;
use crate::app::create_app;
use crate::state::AppState;

pub struct TestResponse {
    pub status: StatusCode,
    /// `Value::Null` for an empty body, a JSON string for a plain text one.
    pub json: Value,
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Router over a custom state, e.g. with one repository swapped out.
    pub fn with_state(state: AppState) -> Self {
        let router = create_app(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        actor: Option<Uuid>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = actor {
            builder = builder.header(ACTOR_HEADER, id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, json }
    }

    pub async fn get(&self, uri: &str, actor: Option<Uuid>) -> TestResponse {
        self.request(Method::GET, uri, actor, None).await
    }

    pub async fn post(&self, uri: &str, actor: Option<Uuid>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, actor, Some(body)).await
    }

    pub async fn put(&self, uri: &str, actor: Option<Uuid>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, actor, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, actor: Option<Uuid>) -> TestResponse {
        self.request(Method::DELETE, uri, actor, None).await
    }

    pub async fn admin(&self) -> User {
        let name = unique("admin");
        let user = User::new(&name, format!("{name}@example.com"), UserType::Admin)
            .with_name("Ada", "Admin");
        self.state.users.create_user(&user, None).await.unwrap();
        user
    }

    pub async fn client(&self) -> (User, ClientProfile) {
        let name = unique("client");
        let user = User::new(&name, format!("{name}@example.com"), UserType::Client)
            .with_name("Jane", "Doe");
        let profile = ClientProfile::new(user.id, "Acme");
        self.state
            .users
            .create_user(&user, Some(&Profile::Client(profile.clone())))
            .await
            .unwrap();
        (user, profile)
    }

    pub async fn technician(&self) -> (User, TechnicianProfile) {
        let name = unique("tech");
        let user = User::new(&name, format!("{name}@example.com"), UserType::Technician)
            .with_name("Paul", "Martin");
        let profile = TechnicianProfile::new(user.id, Some(Specialty::Network));
        self.state
            .users
            .create_user(&user, Some(&Profile::Technician(profile.clone())))
            .await
            .unwrap();
        (user, profile)
    }

    /// Stores a coded ticket directly, bypassing the HTTP layer.
    pub async fn ticket(
        &self,
        client: &ClientProfile,
        technician: Option<&TechnicianProfile>,
        status: TicketStatus,
    ) -> Ticket {
        let mut ticket = Ticket::new(client.id, "Printer jam", "Tray 2 is stuck")
            .with_code(format!("TKT-N{:03}-2020", next_code_number()))
            .with_status(status);
        ticket.technician_id = technician.map(|t| t.id);
        self.state.tickets.create_ticket(&ticket).await.unwrap();
        ticket
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn next_code_number() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
