use std::collections::HashSet;

use uuid::Uuid;

use crate::procedures::{
    matches_search, Difficulty, Procedure, ProcedureCategory, ProcedureStatus,
};
use crate::tickets::{Ticket, TicketPriority, TicketScope, TicketStatus};

/// Criteria for listing tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketFilter {
    pub scope: TicketScope,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            scope: TicketScope::All,
            status: None,
            priority: None,
        }
    }
}

impl TicketFilter {
    pub fn scoped(scope: TicketScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.scope.includes(ticket)
            && self.status.is_none_or(|s| ticket.status == s)
            && self.priority.is_none_or(|p| ticket.priority == p)
    }
}

/// Criteria for listing procedures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureFilter {
    pub category: Option<ProcedureCategory>,
    pub difficulty: Option<Difficulty>,
    pub status: Option<ProcedureStatus>,
    pub featured: Option<bool>,
    /// Tag slug.
    pub tag: Option<String>,
    /// Case-insensitive match on title, description or content.
    pub search: Option<String>,
}

impl ProcedureFilter {
    /// Checks every criterion except `tag`.
    ///
    /// Tags live in a relation, so backends resolve them separately and pass
    /// the tag slugs of the procedure in `tag_slugs`.
    pub fn matches(&self, procedure: &Procedure, tag_slugs: &HashSet<String>) -> bool {
        self.category.is_none_or(|c| procedure.category == c)
            && self.difficulty.is_none_or(|d| procedure.difficulty == d)
            && self.status.is_none_or(|s| procedure.status == s)
            && self.featured.is_none_or(|f| procedure.featured == f)
            && self.tag.as_ref().is_none_or(|t| tag_slugs.contains(t))
            && self
                .search
                .as_deref()
                .filter(|q| !q.trim().is_empty())
                .is_none_or(|q| matches_search(procedure, q.trim()))
    }
}

/// Normalized key of a symmetric relation between two procedures.
pub fn relation_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
