use uuid::Uuid;

/// Returns the cache key for a single ticket.
pub fn ticket_key(ticket_id: Uuid) -> String {
    format!("ticket:{}", ticket_id)
}

/// Matches every cached ticket.
///
/// Used after cascades that touch an unknown set of tickets.
pub fn tickets_pattern() -> &'static str {
    "ticket:*"
}

/// Returns the cache key for a user.
pub fn user_key(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::pattern_matches;

    #[test]
    fn test_ticket_key() {
        assert_eq!(
            ticket_key(Uuid::nil()),
            "ticket:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_user_key() {
        assert_eq!(
            user_key(Uuid::nil()),
            "user:00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_tickets_pattern_only_matches_tickets() {
        assert!(pattern_matches(tickets_pattern(), &ticket_key(Uuid::nil())));
        assert!(!pattern_matches(tickets_pattern(), &user_key(Uuid::nil())));
    }
}
