//! Knowledge-base handlers: procedures, their tags, relations, media and
//! reader interactions.

use std::collections::HashSet;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use helpdesk_core::procedures::{
    normalize_related_ids, normalize_tag_names, prepare_procedure, slugify, validate_procedure,
    Procedure, ProcedureAttachment, ProcedureError, ProcedureInteraction, ProcedureTag,
};

use super::error::{json_body, not_found};
use super::{Actor, AppError};
use crate::models::{
    AttachmentUpload, AttachmentView, CountersView, CreateInteraction, CreateProcedure,
    DownloadView, ImageUpload, ImageView, ListProceduresQuery, ProcedureView, UpdateProcedure,
    UserSummary,
};
use crate::state::AppState;

async fn load_procedure(state: &AppState, id: Uuid) -> Result<Procedure, AppError> {
    state
        .procedures
        .get_procedure(id)
        .await?
        .ok_or_else(|| not_found("Procedure"))
}

/// Loads the author, tags and relations around a procedure.
async fn procedure_view(state: &AppState, procedure: Procedure) -> Result<ProcedureView, AppError> {
    let author = match procedure.author_id {
        Some(id) => state.users.get_user(id).await?.as_ref().map(UserSummary::from),
        None => None,
    };
    let tags = state.procedures.get_procedure_tags(procedure.id).await?;
    let related = state.procedures.get_related_procedures(procedure.id).await?;

    Ok(ProcedureView::new(procedure, author, tags, related, &state.media))
}

/// Derives the slug and meta description, keeping an existing slug.
async fn fill_derived_fields(state: &AppState, procedure: &mut Procedure) -> Result<(), AppError> {
    let taken: HashSet<String> = if procedure.slug.is_empty() {
        state
            .procedures
            .procedure_slugs_with_prefix(&slugify(&procedure.title))
            .await?
            .into_iter()
            .collect()
    } else {
        HashSet::new()
    };
    prepare_procedure(procedure, |slug| taken.contains(slug));
    Ok(())
}

/// Fails with `SlugTaken` when another procedure owns `slug`.
async fn ensure_slug_free(state: &AppState, slug: &str, owner: Uuid) -> Result<(), AppError> {
    match state.procedures.get_procedure_by_slug(slug).await? {
        Some(existing) if existing.id != owner => {
            Err(ProcedureError::SlugTaken(slug.to_string()).into())
        }
        _ => Ok(()),
    }
}

/// Checks a replacement relation set before anything is written.
async fn checked_related_ids(
    state: &AppState,
    procedure_id: Uuid,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let ids = normalize_related_ids(procedure_id, ids)?;
    for id in &ids {
        load_procedure(state, *id).await?;
    }
    Ok(ids)
}

/// Replaces the tags of a procedure, creating unknown tags on the way.
async fn replace_tags(state: &AppState, procedure_id: Uuid, names: &[String]) -> Result<(), AppError> {
    let mut tag_ids = Vec::new();
    for name in normalize_tag_names(names) {
        tag_ids.push(state.procedures.get_or_create_tag(&name).await?.id);
    }
    state
        .procedures
        .set_procedure_tags(procedure_id, &tag_ids)
        .await?;
    Ok(())
}

/// List procedures (GET /api/procedures).
///
/// Featured first, then newest.
pub async fn list_procedures(
    State(state): State<AppState>,
    Query(query): Query<ListProceduresQuery>,
) -> Result<Json<Vec<ProcedureView>>, AppError> {
    let procedures = state.procedures.list_procedures(&query.into()).await?;

    let mut views = Vec::with_capacity(procedures.len());
    for procedure in procedures {
        views.push(procedure_view(&state, procedure).await?);
    }
    Ok(Json(views))
}

/// Write a procedure (POST /api/procedures).
pub async fn create_procedure(
    actor: Actor,
    State(state): State<AppState>,
    payload: Result<Json<CreateProcedure>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcedureView>), AppError> {
    let (mut procedure, tag_names, related_ids) = json_body(payload)?.into_parts(actor.user.id);
    validate_procedure(&procedure)?;

    if !procedure.slug.is_empty() {
        ensure_slug_free(&state, &procedure.slug, procedure.id).await?;
    }
    fill_derived_fields(&state, &mut procedure).await?;
    let related_ids = checked_related_ids(&state, procedure.id, &related_ids).await?;

    state.procedures.create_procedure(&procedure).await?;
    replace_tags(&state, procedure.id, &tag_names).await?;
    if !related_ids.is_empty() {
        state
            .procedures
            .set_related_procedures(procedure.id, &related_ids)
            .await?;
    }

    tracing::info!(procedure_id = %procedure.id, slug = %procedure.slug, "Created procedure");

    let view = procedure_view(&state, procedure).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Get a procedure (GET /api/procedures/{id}).
pub async fn get_procedure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcedureView>, AppError> {
    let procedure = load_procedure(&state, id).await?;

    Ok(Json(procedure_view(&state, procedure).await?))
}

/// Get a procedure by slug (GET /api/procedures/slug/{slug}).
pub async fn get_procedure_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProcedureView>, AppError> {
    let procedure = state
        .procedures
        .get_procedure_by_slug(&slug)
        .await?
        .ok_or_else(|| not_found("Procedure"))?;

    Ok(Json(procedure_view(&state, procedure).await?))
}

/// Partially update a procedure (PUT/PATCH /api/procedures/{id}).
///
/// A new title never regenerates the slug; only an explicit one changes it.
pub async fn update_procedure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProcedure>, JsonRejection>,
) -> Result<Json<ProcedureView>, AppError> {
    let mut payload = json_body(payload)?;
    let mut procedure = load_procedure(&state, id).await?;

    payload.apply_to(&mut procedure);
    if let Some(slug) = payload.slug.take() {
        let slug = slug.trim().to_string();
        if slug != procedure.slug {
            ensure_slug_free(&state, &slug, id).await?;
            procedure.slug = slug;
        }
    }
    validate_procedure(&procedure)?;
    fill_derived_fields(&state, &mut procedure).await?;

    let related_ids = match payload.related_ids.as_deref() {
        Some(ids) => Some(checked_related_ids(&state, id, ids).await?),
        None => None,
    };

    state.procedures.update_procedure(&procedure).await?;
    if let Some(names) = payload.tag_names.as_deref() {
        replace_tags(&state, id, names).await?;
    }
    if let Some(ids) = related_ids {
        state.procedures.set_related_procedures(id, &ids).await?;
    }

    tracing::info!(procedure_id = %id, "Updated procedure");

    // Counters and media may have moved since the first read.
    let procedure = load_procedure(&state, id).await?;
    Ok(Json(procedure_view(&state, procedure).await?))
}

/// Delete a procedure (DELETE /api/procedures/{id}).
pub async fn delete_procedure(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.procedures.delete_procedure(id).await?;

    tracing::info!(procedure_id = %id, "Deleted procedure");

    Ok(StatusCode::NO_CONTENT)
}

/// Record a view, like, bookmark or share (POST /api/procedures/{id}/interactions).
///
/// Each kind counts once per user.
pub async fn record_interaction(
    actor: Actor,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreateInteraction>, JsonRejection>,
) -> Result<Json<CountersView>, AppError> {
    let payload = json_body(payload)?;
    load_procedure(&state, id).await?;

    let interaction = ProcedureInteraction::new(actor.user.id, id, payload.kind);
    let recorded = state.procedures.record_interaction(&interaction).await?;

    tracing::debug!(procedure_id = %id, user_id = %actor.user.id, recorded, "Procedure interaction");

    let procedure = load_procedure(&state, id).await?;
    Ok(Json(CountersView {
        recorded,
        views: procedure.views,
        likes: procedure.likes,
        bookmarks: procedure.bookmarks,
    }))
}

/// Attach an uploaded image (POST /api/procedures/{id}/images).
pub async fn add_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ImageUpload>, JsonRejection>,
) -> Result<(StatusCode, Json<ImageView>), AppError> {
    let image = json_body(payload)?.into_procedure_image();

    state.procedures.add_procedure_image(id, &image).await?;

    tracing::info!(procedure_id = %id, image_id = %image.id, "Added procedure image");

    Ok((
        StatusCode::CREATED,
        Json(ImageView::from_procedure(image, &state.media)),
    ))
}

/// Attach an uploaded file (POST /api/procedures/{id}/attachments).
pub async fn add_attachment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AttachmentUpload>, JsonRejection>,
) -> Result<(StatusCode, Json<AttachmentView>), AppError> {
    let attachment: ProcedureAttachment = json_body(payload)?.into();

    state.procedures.add_procedure_attachment(id, &attachment).await?;

    tracing::info!(procedure_id = %id, attachment_id = %attachment.id, "Added procedure attachment");

    Ok((
        StatusCode::CREATED,
        Json(AttachmentView::new(attachment, &state.media)),
    ))
}

/// Count a download and hand out the file URL
/// (POST /api/procedures/{id}/attachments/{attachment_id}/download).
pub async fn download_attachment(
    State(state): State<AppState>,
    Path((id, attachment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DownloadView>, AppError> {
    let attachment = state
        .procedures
        .increment_attachment_downloads(id, attachment_id)
        .await?;

    Ok(Json(DownloadView {
        file_url: state.media.raw_url(&attachment.file),
        downloads: attachment.downloads,
    }))
}

/// All tags, by name (GET /api/procedure-tags).
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<ProcedureTag>>, AppError> {
    Ok(Json(state.procedures.list_tags().await?))
}
