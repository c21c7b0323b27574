use thiserror::Error;

/// Errors raised while creating or updating tickets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TicketError {
    #[error("Ticket title cannot be empty")]
    EmptyTitle,
    #[error("Ticket title too long (max 200 characters)")]
    TitleTooLong,
    #[error("Ticket description cannot be empty")]
    EmptyDescription,
    #[error("Malformed ticket code: {0}")]
    MalformedCode(String),
    #[error("Invalid ticket status: {0}")]
    InvalidStatus(String),
    #[error("Invalid ticket priority: {0}")]
    InvalidPriority(String),
    #[error("Admin must specify a client for the ticket")]
    ClientRequired,
    #[error("Only clients or admins can create tickets")]
    CreatorNotAllowed,
}

/// Maps a [`TicketError`] to an HTTP status code.
///
/// - `MalformedCode` -> 500 (stored data is inconsistent)
/// - everything else -> 400
pub fn ticket_error_to_status_code(error: &TicketError) -> u16 {
    match error {
        TicketError::MalformedCode(_) => 500,
        _ => 400,
    }
}
