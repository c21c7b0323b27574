use uuid::Uuid;

use crate::accounts::{Profile, User, UserType};

use super::error::TicketError;
use super::types::{Ticket, TicketScope};

const TITLE_MAX_LEN: usize = 200;

/// Suffix shared by every ticket code of a given year.
pub fn ticket_code_suffix(year: i32) -> String {
    format!("-{year}")
}

/// Computes the next ticket code for `year`.
///
/// `last_code` is the code of the most recently created ticket of the same
/// year, if any. Codes look like `TKT-N007-2024`.
pub fn next_ticket_code(last_code: Option<&str>, year: i32) -> Result<String, TicketError> {
    let next = match last_code {
        Some(code) => parse_ticket_number(code)? + 1,
        None => 1,
    };
    Ok(format!("TKT-N{next:03}-{year}"))
}

/// Extracts the sequence number from a ticket code.
pub fn parse_ticket_number(code: &str) -> Result<u32, TicketError> {
    code.split('-')
        .nth(1)
        .and_then(|segment| segment.strip_prefix('N'))
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or_else(|| TicketError::MalformedCode(code.to_string()))
}

/// Validates a ticket before creation or update.
pub fn validate_ticket(ticket: &Ticket) -> Result<(), TicketError> {
    if ticket.title.trim().is_empty() {
        return Err(TicketError::EmptyTitle);
    }
    if ticket.title.chars().count() > TITLE_MAX_LEN {
        return Err(TicketError::TitleTooLong);
    }
    if ticket.description.trim().is_empty() {
        return Err(TicketError::EmptyDescription);
    }
    Ok(())
}

/// Resolves the client profile a new ticket is filed for.
///
/// Clients file on their own profile; admins must name one explicitly.
pub fn resolve_ticket_client(
    actor: &User,
    actor_profile: Option<&Profile>,
    requested_client_id: Option<Uuid>,
) -> Result<Uuid, TicketError> {
    match actor.user_type {
        UserType::Client => actor_profile
            .and_then(Profile::as_client)
            .map(|client| client.id)
            .ok_or(TicketError::CreatorNotAllowed),
        UserType::Admin => requested_client_id.ok_or(TicketError::ClientRequired),
        UserType::Technician => Err(TicketError::CreatorNotAllowed),
    }
}

/// Ticket visibility for an actor.
pub fn ticket_scope_for(actor: &User, actor_profile: Option<&Profile>) -> TicketScope {
    match (actor.user_type, actor_profile) {
        (UserType::Admin, _) => TicketScope::All,
        (UserType::Client, Some(Profile::Client(c))) => TicketScope::Client(c.id),
        (UserType::Technician, Some(Profile::Technician(t))) => TicketScope::Technician(t.id),
        _ => TicketScope::Nothing,
    }
}

/// Returns the technician that should be notified after an assignment change.
///
/// Only a change to a new technician notifies; re-saving the same assignee
/// or clearing it does not.
pub fn newly_assigned_technician(previous: Option<Uuid>, current: Option<Uuid>) -> Option<Uuid> {
    match current {
        Some(id) if previous != Some(id) => Some(id),
        _ => None,
    }
}

/// Orders tickets newest first.
pub fn sort_tickets_newest_first(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{ClientProfile, TechnicianProfile};
    use chrono::{Duration, Utc};

    #[test]
    fn test_first_code_of_year() {
        assert_eq!(next_ticket_code(None, 2024).unwrap(), "TKT-N001-2024");
    }

    #[test]
    fn test_next_code_increments() {
        assert_eq!(
            next_ticket_code(Some("TKT-N007-2024"), 2024).unwrap(),
            "TKT-N008-2024"
        );
    }

    #[test]
    fn test_code_grows_past_three_digits() {
        assert_eq!(
            next_ticket_code(Some("TKT-N999-2025"), 2025).unwrap(),
            "TKT-N1000-2025"
        );
    }

    #[test]
    fn test_malformed_code_is_rejected() {
        assert_eq!(
            next_ticket_code(Some("TKT-007-2024"), 2024),
            Err(TicketError::MalformedCode("TKT-007-2024".to_string()))
        );
    }

    #[test]
    fn test_validate_ticket() {
        let client = Uuid::new_v4();
        assert!(validate_ticket(&Ticket::new(client, "Printer jam", "Tray 2")).is_ok());
        assert_eq!(
            validate_ticket(&Ticket::new(client, " ", "x")),
            Err(TicketError::EmptyTitle)
        );
        assert_eq!(
            validate_ticket(&Ticket::new(client, "a".repeat(201), "x")),
            Err(TicketError::TitleTooLong)
        );
    }

    #[test]
    fn test_resolve_client_for_client_actor() {
        let user = User::new("c", "c@example.com", UserType::Client);
        let profile = Profile::Client(ClientProfile::new(user.id, "ACME"));
        let resolved = resolve_ticket_client(&user, Some(&profile), Some(Uuid::new_v4()));
        assert_eq!(resolved, Ok(profile.id()));
    }

    #[test]
    fn test_resolve_client_for_admin_requires_id() {
        let admin = User::new("a", "a@example.com", UserType::Admin);
        assert_eq!(
            resolve_ticket_client(&admin, None, None),
            Err(TicketError::ClientRequired)
        );
        let id = Uuid::new_v4();
        assert_eq!(resolve_ticket_client(&admin, None, Some(id)), Ok(id));
    }

    #[test]
    fn test_technician_cannot_create_ticket() {
        let tech = User::new("t", "t@example.com", UserType::Technician);
        let profile = Profile::Technician(TechnicianProfile::new(tech.id, None));
        assert_eq!(
            resolve_ticket_client(&tech, Some(&profile), None),
            Err(TicketError::CreatorNotAllowed)
        );
    }

    #[test]
    fn test_scope_for_roles() {
        let tech = User::new("t", "t@example.com", UserType::Technician);
        let profile = Profile::Technician(TechnicianProfile::new(tech.id, None));
        assert_eq!(
            ticket_scope_for(&tech, Some(&profile)),
            TicketScope::Technician(profile.id())
        );
        assert_eq!(ticket_scope_for(&tech, None), TicketScope::Nothing);

        let admin = User::new("a", "a@example.com", UserType::Admin);
        assert_eq!(ticket_scope_for(&admin, None), TicketScope::All);
    }

    #[test]
    fn test_newly_assigned_technician() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(newly_assigned_technician(None, Some(a)), Some(a));
        assert_eq!(newly_assigned_technician(Some(a), Some(b)), Some(b));
        assert_eq!(newly_assigned_technician(Some(a), Some(a)), None);
        assert_eq!(newly_assigned_technician(Some(a), None), None);
    }

    #[test]
    fn test_sort_newest_first() {
        let client = Uuid::new_v4();
        let now = Utc::now();
        let old = Ticket::new(client, "old", "d").with_created_at(now - Duration::hours(1));
        let new = Ticket::new(client, "new", "d").with_created_at(now);
        let mut tickets = vec![old, new];
        sort_tickets_newest_first(&mut tickets);
        assert_eq!(tickets[0].title, "new");
    }
}
