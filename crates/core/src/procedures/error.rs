use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcedureError {
    #[error("Procedure title cannot be empty")]
    EmptyTitle,
    #[error("Procedure title too long (max 200 characters)")]
    TitleTooLong,
    #[error("Procedure description cannot be empty")]
    EmptyDescription,
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),
    #[error("Invalid procedure status: {0}")]
    InvalidStatus(String),
    #[error("Invalid interaction type: {0}")]
    InvalidInteraction(String),
    #[error("A procedure cannot be related to itself")]
    SelfRelation,
    #[error("Slug already in use: {0}")]
    SlugTaken(String),
}

/// Maps a [`ProcedureError`] to an HTTP status code.
///
/// - `SlugTaken` -> 409
/// - everything else -> 400
pub fn procedure_error_to_status_code(error: &ProcedureError) -> u16 {
    match error {
        ProcedureError::SlugTaken(_) => 409,
        _ => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            procedure_error_to_status_code(&ProcedureError::SlugTaken("a".to_string())),
            409
        );
        assert_eq!(
            procedure_error_to_status_code(&ProcedureError::SelfRelation),
            400
        );
    }
}
