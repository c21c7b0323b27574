use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterventionError {
    #[error("Intervention report cannot be empty")]
    EmptyReport,
    #[error("End time must be after start time")]
    InvalidTimeRange,
    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),
    #[error("{0} has too many digits")]
    AmountOutOfRange(&'static str),
    #[error("{0} cannot have more than 2 decimal places")]
    TooManyDecimalPlaces(&'static str),
    #[error("Customer rating must be between 1 and 5")]
    InvalidCustomerRating,
    #[error("Invalid intervention status: {0}")]
    InvalidStatus(String),
}

/// Maps an [`InterventionError`] to an HTTP status code. All variants are 400.
pub fn intervention_error_to_status_code(_error: &InterventionError) -> u16 {
    400
}
