//! Health check endpoints for Kubernetes-style probes.
//!
//! - `/livez` - Basic liveness probe (immediate 200, no checks)
//! - `/healthz` - Reports the compiled-in storage backend

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /livez - Basic liveness probe.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

/// GET /healthz - Service status and storage backend.
#[axum::debug_handler(state = AppState)]
pub async fn healthz(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "storage": state.storage_name,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::handlers::test_support::TestApp;

    #[tokio::test]
    async fn test_livez() {
        let app = TestApp::new();

        let response = app.get("/livez", None).await;

        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_healthz_reports_storage() {
        let app = TestApp::new();

        let response = app.get("/healthz", None).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json["status"], "ok");
        assert_eq!(response.json["storage"], "inmemory");
    }
}
