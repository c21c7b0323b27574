use thiserror::Error;

/// Errors raised while validating accounts and profiles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Username cannot be empty")]
    EmptyUsername,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Téléphone au format +242055506688 (8-15 chiffres): {0}")]
    InvalidPhone(String),
    #[error("Company is required for clients.")]
    EmptyCompany,
    #[error("Specialty is required for technicians.")]
    MissingSpecialty,
    #[error("Invalid user type: {0}")]
    InvalidUserType(String),
    #[error("Invalid specialty: {0}")]
    InvalidSpecialty(String),
}

/// Maps an [`AccountError`] to an HTTP status code.
///
/// Every account error is a client input problem, so this is always 400.
pub fn account_error_to_status_code(_error: &AccountError) -> u16 {
    400
}
