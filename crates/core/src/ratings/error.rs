use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("Rating must be between 1 and 5")]
    InvalidScore,
    #[error("Only clients can rate technicians")]
    OnlyClientsRateTechnicians,
    #[error("Only technicians can rate clients")]
    OnlyTechniciansRateClients,
    #[error("You have already rated this technician")]
    AlreadyRatedTechnician,
    #[error("You have already rated this client")]
    AlreadyRatedClient,
    #[error("You can only rate technicians you've worked with on closed tickets")]
    NoClosedTicketWithTechnician,
    #[error("You can only rate clients you've worked with on closed tickets")]
    NoClosedTicketWithClient,
}

/// Maps a [`RatingError`] to an HTTP status code.
///
/// - `InvalidScore`, `AlreadyRated*` -> 400
/// - role and closed-ticket checks -> 403
pub fn rating_error_to_status_code(error: &RatingError) -> u16 {
    match error {
        RatingError::InvalidScore
        | RatingError::AlreadyRatedTechnician
        | RatingError::AlreadyRatedClient => 400,
        RatingError::OnlyClientsRateTechnicians
        | RatingError::OnlyTechniciansRateClients
        | RatingError::NoClosedTicketWithTechnician
        | RatingError::NoClosedTicketWithClient => 403,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_rated_is_bad_request() {
        assert_eq!(
            rating_error_to_status_code(&RatingError::AlreadyRatedTechnician),
            400
        );
    }

    #[test]
    fn test_missing_closed_ticket_is_forbidden() {
        assert_eq!(
            rating_error_to_status_code(&RatingError::NoClosedTicketWithClient),
            403
        );
        assert_eq!(
            rating_error_to_status_code(&RatingError::OnlyClientsRateTechnicians),
            403
        );
    }
}
