//! PDF and report exports. Not available in this build: every route
//! answers 501 so clients can feature-detect.

use axum::extract::Path;
use uuid::Uuid;

use super::error::ApiError;
use super::AppError;

/// GET /api/tickets/export/pdf
pub async fn export_tickets_pdf() -> Result<(), AppError> {
    Err(ApiError::ExportDisabled.into())
}

/// GET /api/interventions/{id}/report
pub async fn intervention_report(Path(_id): Path<Uuid>) -> Result<(), AppError> {
    Err(ApiError::ExportDisabled.into())
}

/// GET /api/reports/monthly
pub async fn monthly_report() -> Result<(), AppError> {
    Err(ApiError::ExportDisabled.into())
}
