mod error;
mod operations;
mod types;

pub use error::{ticket_error_to_status_code, TicketError};
pub use operations::{
    newly_assigned_technician, next_ticket_code, parse_ticket_number, resolve_ticket_client,
    sort_tickets_newest_first, ticket_code_suffix, ticket_scope_for, validate_ticket,
};
pub use types::{Ticket, TicketImage, TicketPriority, TicketScope, TicketStatus};
