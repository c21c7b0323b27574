use uuid::Uuid;

use crate::accounts::{Profile, UserType};
use crate::tickets::{Ticket, TicketStatus};

use super::error::RatingError;
use super::types::RatingSummary;

pub fn validate_score(rating: u8) -> Result<(), RatingError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(RatingError::InvalidScore)
    }
}

/// Mean of the given scores, 0 when empty.
pub fn summarize(scores: &[u8]) -> RatingSummary {
    if scores.is_empty() {
        return RatingSummary::default();
    }
    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    RatingSummary {
        average_rating: f64::from(sum) / scores.len() as f64,
        total_ratings: scores.len(),
    }
}

/// True when the client and technician share a closed ticket.
pub fn shares_closed_ticket(tickets: &[Ticket], client_id: Uuid, technician_id: Uuid) -> bool {
    tickets.iter().any(|t| {
        t.status == TicketStatus::Closed
            && t.client_id == client_id
            && t.technician_id == Some(technician_id)
    })
}

/// Returns the rating client's profile ID, or the role error.
pub fn rater_client_id(
    user_type: UserType,
    profile: Option<&Profile>,
) -> Result<Uuid, RatingError> {
    match (user_type, profile) {
        (UserType::Client, Some(Profile::Client(c))) => Ok(c.id),
        _ => Err(RatingError::OnlyClientsRateTechnicians),
    }
}

/// Returns the rating technician's profile ID, or the role error.
pub fn rater_technician_id(
    user_type: UserType,
    profile: Option<&Profile>,
) -> Result<Uuid, RatingError> {
    match (user_type, profile) {
        (UserType::Technician, Some(Profile::Technician(t))) => Ok(t.id),
        _ => Err(RatingError::OnlyTechniciansRateClients),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{ClientProfile, TechnicianProfile};

    #[test]
    fn test_validate_score() {
        assert!(validate_score(1).is_ok());
        assert!(validate_score(5).is_ok());
        assert_eq!(validate_score(0), Err(RatingError::InvalidScore));
        assert_eq!(validate_score(6), Err(RatingError::InvalidScore));
    }

    #[test]
    fn test_summarize_empty_is_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.average_rating, 0.0);
        assert_eq!(summary.total_ratings, 0);
    }

    #[test]
    fn test_summarize_mean() {
        let summary = summarize(&[5, 4, 4]);
        assert!((summary.average_rating - 13.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(summary.total_ratings, 3);
    }

    #[test]
    fn test_shares_closed_ticket() {
        let client = Uuid::new_v4();
        let tech = Uuid::new_v4();
        let open = Ticket::new(client, "t", "d").with_technician(tech);
        assert!(!shares_closed_ticket(std::slice::from_ref(&open), client, tech));

        let closed = open.with_status(TicketStatus::Closed);
        assert!(shares_closed_ticket(std::slice::from_ref(&closed), client, tech));
        assert!(!shares_closed_ticket(&[closed], client, Uuid::new_v4()));
    }

    #[test]
    fn test_rater_roles() {
        let client = Profile::Client(ClientProfile::new(Uuid::new_v4(), "ACME"));
        let tech = Profile::Technician(TechnicianProfile::new(Uuid::new_v4(), None));

        assert_eq!(rater_client_id(UserType::Client, Some(&client)), Ok(client.id()));
        assert_eq!(
            rater_client_id(UserType::Technician, Some(&tech)),
            Err(RatingError::OnlyClientsRateTechnicians)
        );
        assert_eq!(
            rater_technician_id(UserType::Technician, Some(&tech)),
            Ok(tech.id())
        );
        assert_eq!(
            rater_technician_id(UserType::Admin, None),
            Err(RatingError::OnlyTechniciansRateClients)
        );
    }
}
