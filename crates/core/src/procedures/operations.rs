use uuid::Uuid;

use super::error::ProcedureError;
use super::text::{meta_description, slugify, unique_slug};
use super::types::{InteractionKind, Procedure};

const TITLE_MAX_LEN: usize = 200;

pub fn validate_procedure(procedure: &Procedure) -> Result<(), ProcedureError> {
    if procedure.title.trim().is_empty() {
        return Err(ProcedureError::EmptyTitle);
    }
    if procedure.title.chars().count() > TITLE_MAX_LEN {
        return Err(ProcedureError::TitleTooLong);
    }
    if procedure.description.trim().is_empty() {
        return Err(ProcedureError::EmptyDescription);
    }
    Ok(())
}

/// Fills the derived fields of a procedure before it is saved.
///
/// An existing slug is kept; otherwise one is derived from the title.
/// The meta description is only derived when empty.
pub fn prepare_procedure(procedure: &mut Procedure, slug_taken: impl Fn(&str) -> bool) {
    if procedure.slug.is_empty() {
        procedure.slug = unique_slug(&slugify(&procedure.title), slug_taken);
    }
    if procedure.meta_description.is_empty() {
        if let Some(meta) = meta_description(&procedure.description) {
            procedure.meta_description = meta;
        }
    }
}

/// Trims tag names, drops blanks and duplicates, keeps first-seen order.
pub fn normalize_tag_names(names: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Validates and deduplicates a replacement set of related procedures.
pub fn normalize_related_ids(procedure_id: Uuid, ids: &[Uuid]) -> Result<Vec<Uuid>, ProcedureError> {
    if ids.contains(&procedure_id) {
        return Err(ProcedureError::SelfRelation);
    }
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    Ok(unique)
}

/// Bumps the counter matching a first-time interaction. Shares have no counter.
pub fn apply_interaction(procedure: &mut Procedure, kind: InteractionKind) {
    match kind {
        InteractionKind::View => procedure.views += 1,
        InteractionKind::Like => procedure.likes += 1,
        InteractionKind::Bookmark => procedure.bookmarks += 1,
        InteractionKind::Share => {}
    }
}

/// Case-insensitive search over title, description and content.
pub fn matches_search(procedure: &Procedure, query: &str) -> bool {
    let needle = query.to_lowercase();
    [&procedure.title, &procedure.description, &procedure.content]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Featured first, then newest.
pub fn sort_procedures(procedures: &mut [Procedure]) {
    procedures.sort_by(|a, b| {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
