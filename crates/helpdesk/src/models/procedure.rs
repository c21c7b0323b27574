use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::media::CloudinaryUrlBuilder;
use helpdesk_core::procedures::{
    content_preview, reading_time, AttachmentType, Difficulty, InteractionKind, Procedure,
    ProcedureAttachment, ProcedureCategory, ProcedureStatus, ProcedureTag,
};
use helpdesk_core::serde::deserialize_optional_string;
use helpdesk_core::storage::ProcedureFilter;

use super::media::{ImageUpload, ImageView};
use super::user::UserSummary;

fn default_true() -> bool {
    true
}

/// An already uploaded file attached to a procedure.
#[derive(Debug, Deserialize)]
pub struct AttachmentUpload {
    /// Storage path.
    pub file: String,
    pub name: String,
    /// MIME type. Decides the attachment type.
    pub file_type: String,
    #[serde(default)]
    pub file_size: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

impl From<AttachmentUpload> for ProcedureAttachment {
    fn from(upload: AttachmentUpload) -> Self {
        let mut attachment = ProcedureAttachment::new(upload.file, upload.name, upload.file_type);
        attachment.file_size = upload.file_size;
        attachment.description = upload.description;
        attachment.is_public = upload.is_public;
        attachment
    }
}

/// Request payload for writing a procedure.
#[derive(Debug, Deserialize)]
pub struct CreateProcedure {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: ProcedureCategory,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub status: ProcedureStatus,
    /// Derived from the title when absent.
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub related_ids: Vec<Uuid>,
    #[serde(default)]
    pub images: Vec<ImageUpload>,
    #[serde(default)]
    pub attachments: Vec<AttachmentUpload>,
}

impl CreateProcedure {
    /// Splits the payload into the procedure and its tag names and relations.
    pub fn into_parts(self, author_id: Uuid) -> (Procedure, Vec<String>, Vec<Uuid>) {
        let mut procedure = Procedure::new(self.title.trim(), self.description)
            .with_content(self.content)
            .with_author(author_id);
        procedure.category = self.category;
        procedure.difficulty = self.difficulty;
        procedure.estimated_time = self.estimated_time;
        procedure.is_active = self.is_active;
        procedure.status = self.status;
        procedure.featured = self.featured;
        if let Some(slug) = self.slug {
            procedure.slug = slug.trim().to_string();
        }
        if let Some(meta) = self.meta_description {
            procedure.meta_description = meta;
        }
        procedure.images = self
            .images
            .into_iter()
            .map(ImageUpload::into_procedure_image)
            .collect();
        procedure.attachments = self.attachments.into_iter().map(Into::into).collect();
        (procedure, self.tag_names, self.related_ids)
    }
}

/// Partial update of a procedure.
///
/// `tag_names` and `related_ids` replace the current sets when present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProcedure {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<ProcedureCategory>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub status: Option<ProcedureStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub slug: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub tag_names: Option<Vec<String>>,
    #[serde(default)]
    pub related_ids: Option<Vec<Uuid>>,
}

impl UpdateProcedure {
    /// Applies the scalar fields. The slug is handled by the caller, which
    /// has to check it is free.
    pub fn apply_to(&mut self, procedure: &mut Procedure) {
        procedure.updated_at = Utc::now();

        if let Some(title) = self.title.take() {
            procedure.title = title.trim().to_string();
        }
        if let Some(description) = self.description.take() {
            procedure.description = description;
        }
        if let Some(content) = self.content.take() {
            procedure.content = content;
        }
        if let Some(category) = self.category {
            procedure.category = category;
        }
        if let Some(difficulty) = self.difficulty {
            procedure.difficulty = difficulty;
        }
        if let Some(estimated_time) = self.estimated_time.take() {
            procedure.estimated_time = estimated_time;
        }
        if let Some(is_active) = self.is_active {
            procedure.is_active = is_active;
        }
        if let Some(status) = self.status {
            procedure.status = status;
        }
        if let Some(meta) = self.meta_description.take() {
            procedure.meta_description = meta;
        }
        if let Some(featured) = self.featured {
            procedure.featured = featured;
        }
    }
}

/// Query parameters for listing procedures.
#[derive(Debug, Default, Deserialize)]
pub struct ListProceduresQuery {
    pub category: Option<ProcedureCategory>,
    pub difficulty: Option<Difficulty>,
    pub status: Option<ProcedureStatus>,
    pub featured: Option<bool>,
    /// Tag slug.
    pub tag: Option<String>,
    pub search: Option<String>,
}

impl From<ListProceduresQuery> for ProcedureFilter {
    fn from(query: ListProceduresQuery) -> Self {
        ProcedureFilter {
            category: query.category,
            difficulty: query.difficulty,
            status: query.status,
            featured: query.featured,
            tag: query.tag.filter(|t| !t.trim().is_empty()),
            search: query.search,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInteraction {
    pub kind: InteractionKind,
}

/// Counters of a procedure after an interaction.
#[derive(Debug, Serialize)]
pub struct CountersView {
    /// False when the user had already recorded this interaction.
    pub recorded: bool,
    pub views: u64,
    pub likes: u64,
    pub bookmarks: u64,
}

#[derive(Debug, Serialize)]
pub struct DownloadView {
    pub file_url: String,
    pub downloads: u64,
}

#[derive(Debug, Serialize)]
pub struct RelatedProcedure {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

impl From<Procedure> for RelatedProcedure {
    fn from(procedure: Procedure) -> Self {
        Self {
            id: procedure.id,
            title: procedure.title,
            slug: procedure.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentView {
    pub id: Uuid,
    pub file: String,
    pub file_url: String,
    pub name: String,
    pub file_type: String,
    pub file_size: String,
    pub attachment_type: AttachmentType,
    pub is_video: bool,
    pub description: String,
    pub is_public: bool,
    pub downloads: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl AttachmentView {
    pub fn new(attachment: ProcedureAttachment, media: &CloudinaryUrlBuilder) -> Self {
        Self {
            is_video: attachment.is_video(),
            file_url: media.raw_url(&attachment.file),
            id: attachment.id,
            file: attachment.file,
            name: attachment.name,
            file_type: attachment.file_type,
            file_size: attachment.file_size,
            attachment_type: attachment.attachment_type,
            description: attachment.description,
            is_public: attachment.is_public,
            downloads: attachment.downloads,
            uploaded_at: attachment.uploaded_at,
        }
    }
}

/// A procedure as returned by the API.
#[derive(Debug, Serialize)]
pub struct ProcedureView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub meta_description: String,
    pub content: String,
    pub content_preview: String,
    pub reading_time: String,
    pub category: ProcedureCategory,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub status: ProcedureStatus,
    pub is_active: bool,
    pub featured: bool,
    pub author_id: Option<Uuid>,
    pub author: Option<UserSummary>,
    pub views: u64,
    pub likes: u64,
    pub bookmarks: u64,
    pub tags: Vec<ProcedureTag>,
    pub related: Vec<RelatedProcedure>,
    pub images: Vec<ImageView>,
    pub attachments: Vec<AttachmentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcedureView {
    pub fn new(
        procedure: Procedure,
        author: Option<UserSummary>,
        tags: Vec<ProcedureTag>,
        related: Vec<Procedure>,
        media: &CloudinaryUrlBuilder,
    ) -> Self {
        Self {
            content_preview: content_preview(&procedure.content),
            reading_time: reading_time(&procedure.content),
            id: procedure.id,
            title: procedure.title,
            slug: procedure.slug,
            description: procedure.description,
            meta_description: procedure.meta_description,
            content: procedure.content,
            category: procedure.category,
            difficulty: procedure.difficulty,
            estimated_time: procedure.estimated_time,
            status: procedure.status,
            is_active: procedure.is_active,
            featured: procedure.featured,
            author_id: procedure.author_id,
            author,
            views: procedure.views,
            likes: procedure.likes,
            bookmarks: procedure.bookmarks,
            tags,
            related: related.into_iter().map(Into::into).collect(),
            images: procedure
                .images
                .into_iter()
                .map(|image| ImageView::from_procedure(image, media))
                .collect(),
            attachments: procedure
                .attachments
                .into_iter()
                .map(|attachment| AttachmentView::new(attachment, media))
                .collect(),
            created_at: procedure.created_at,
            updated_at: procedure.updated_at,
        }
    }
}
