use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use helpdesk_core::accounts::{account_error_to_status_code, AccountError};
use helpdesk_core::interventions::{intervention_error_to_status_code, InterventionError};
use helpdesk_core::messages::{message_error_to_status_code, MessageError};
use helpdesk_core::procedures::{procedure_error_to_status_code, ProcedureError};
use helpdesk_core::ratings::{rating_error_to_status_code, RatingError};
use helpdesk_core::storage::{repository_error_to_status_code, RepositoryError};
use helpdesk_core::tickets::{ticket_error_to_status_code, TicketError};

/// Errors raised by the HTTP layer itself.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Export désactivé")]
    ExportDisabled,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ExportDisabled => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

/// Application error type that wraps `anyhow::Error`.
///
/// The status comes from the first known error type found by downcasting.
/// Anything unknown is a 500.
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn status_code(&self) -> StatusCode {
        let err = &self.0;
        if let Some(e) = err.downcast_ref::<ApiError>() {
            return e.status_code();
        }
        let code = if let Some(e) = err.downcast_ref::<RepositoryError>() {
            repository_error_to_status_code(e)
        } else if let Some(e) = err.downcast_ref::<AccountError>() {
            account_error_to_status_code(e)
        } else if let Some(e) = err.downcast_ref::<TicketError>() {
            ticket_error_to_status_code(e)
        } else if let Some(e) = err.downcast_ref::<InterventionError>() {
            intervention_error_to_status_code(e)
        } else if let Some(e) = err.downcast_ref::<MessageError>() {
            message_error_to_status_code(e)
        } else if let Some(e) = err.downcast_ref::<RatingError>() {
            rating_error_to_status_code(e)
        } else if let Some(e) = err.downcast_ref::<ProcedureError>() {
            procedure_error_to_status_code(e)
        } else {
            500
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Application error");
        } else {
            tracing::warn!(status = %status, message = %message, "API error");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Unwraps a JSON body, turning a rejection into a 400 with the parser message.
pub fn json_body<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(payload)| payload)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())).into())
}

/// Shorthand for a 404 with the usual message.
pub fn not_found(entity: &str) -> AppError {
    ApiError::NotFound(format!("{entity} not found")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_repository_not_found_is_404_json() {
        let err: AppError = RepositoryError::not_found("Ticket", "abc").into();

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_domain_errors_keep_their_status() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (TicketError::CreatorNotAllowed.into(), StatusCode::BAD_REQUEST),
            (RatingError::NoClosedTicketWithTechnician.into(), StatusCode::FORBIDDEN),
            (
                RepositoryError::already_exists("User", "x").into(),
                StatusCode::CONFLICT,
            ),
            (ApiError::ExportDisabled.into(), StatusCode::NOT_IMPLEMENTED),
            (anyhow::anyhow!("boom").into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_export_disabled_message() {
        let response = AppError::from(ApiError::ExportDisabled).into_response();

        assert_eq!(body_json(response).await["error"], "Export désactivé");
    }
}
