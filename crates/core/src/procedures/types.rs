use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ProcedureError;

macro_rules! string_enum {
    ($name:ident, $err:ident, { $($variant:ident => $value:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ProcedureError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(ProcedureError::$err(other.to_string())),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureCategory {
    #[default]
    General,
    Hardware,
    Software,
    Network,
    Security,
    Maintenance,
}

string_enum!(ProcedureCategory, InvalidCategory, {
    General => "general",
    Hardware => "hardware",
    Software => "software",
    Network => "network",
    Security => "security",
    Maintenance => "maintenance",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

string_enum!(Difficulty, InvalidDifficulty, {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

string_enum!(ProcedureStatus, InvalidStatus, {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Like,
    Bookmark,
    Share,
}

string_enum!(InteractionKind, InvalidInteraction, {
    View => "view",
    Like => "like",
    Bookmark => "bookmark",
    Share => "share",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    Document,
    Video,
    Archive,
    #[default]
    Other,
}

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
];

const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
];

impl AttachmentType {
    /// Classifies an attachment from its MIME type.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video/") {
            AttachmentType::Video
        } else if DOCUMENT_MIME_TYPES.contains(&mime) {
            AttachmentType::Document
        } else if ARCHIVE_MIME_TYPES.contains(&mime) {
            AttachmentType::Archive
        } else {
            AttachmentType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentType::Document => "document",
            AttachmentType::Video => "video",
            AttachmentType::Archive => "archive",
            AttachmentType::Other => "other",
        }
    }
}

pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureTag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl ProcedureTag {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            color: DEFAULT_TAG_COLOR.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureImage {
    pub id: Uuid,
    pub image: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub order: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
    pub file_extension: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureAttachment {
    pub id: Uuid,
    /// Storage path of the file.
    pub file: String,
    pub name: String,
    /// MIME type.
    pub file_type: String,
    pub file_size: String,
    pub attachment_type: AttachmentType,
    pub description: String,
    pub is_public: bool,
    pub downloads: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl ProcedureAttachment {
    /// Creates a public attachment, typed from its MIME type.
    pub fn new(
        file: impl Into<String>,
        name: impl Into<String>,
        file_type: impl Into<String>,
    ) -> Self {
        let file_type = file_type.into();
        Self {
            id: Uuid::new_v4(),
            file: file.into(),
            name: name.into(),
            attachment_type: AttachmentType::from_mime(&file_type),
            file_type,
            file_size: String::new(),
            description: String::new(),
            is_public: true,
            downloads: 0,
            uploaded_at: Utc::now(),
        }
    }

    pub fn is_video(&self) -> bool {
        self.attachment_type == AttachmentType::Video || self.file_type.starts_with("video/")
    }
}

/// A knowledge-base article.
///
/// Tags and related procedures are relations kept by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// HTML body.
    pub content: String,
    pub category: ProcedureCategory,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub is_active: bool,
    /// Author user ID. Cleared when the author is deleted.
    pub author_id: Option<Uuid>,
    pub views: u64,
    pub likes: u64,
    pub bookmarks: u64,
    pub status: ProcedureStatus,
    pub slug: String,
    pub meta_description: String,
    pub featured: bool,
    pub images: Vec<ProcedureImage>,
    pub attachments: Vec<ProcedureAttachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Procedure {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            content: String::new(),
            category: ProcedureCategory::default(),
            difficulty: Difficulty::default(),
            estimated_time: String::new(),
            is_active: true,
            author_id: None,
            views: 0,
            likes: 0,
            bookmarks: 0,
            status: ProcedureStatus::default(),
            slug: String::new(),
            meta_description: String::new(),
            featured: false,
            images: Vec::new(),
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// A recorded view, like, bookmark or share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureInteraction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub procedure_id: Uuid,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

impl ProcedureInteraction {
    pub fn new(user_id: Uuid, procedure_id: Uuid, kind: InteractionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            procedure_id,
            kind,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_type_from_mime() {
        assert_eq!(AttachmentType::from_mime("video/mp4"), AttachmentType::Video);
        assert_eq!(
            AttachmentType::from_mime("application/pdf"),
            AttachmentType::Document
        );
        assert_eq!(
            AttachmentType::from_mime("application/x-7z-compressed"),
            AttachmentType::Archive
        );
        assert_eq!(AttachmentType::from_mime("image/png"), AttachmentType::Other);
    }

    #[test]
    fn test_is_video_checks_mime_too() {
        let mut attachment = ProcedureAttachment::new("a/b.bin", "clip", "video/webm");
        assert!(attachment.is_video());
        attachment.attachment_type = AttachmentType::Other;
        assert!(attachment.is_video());
        let pdf = ProcedureAttachment::new("a/b.pdf", "doc", "application/pdf");
        assert!(!pdf.is_video());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(
            "maintenance".parse::<ProcedureCategory>(),
            Ok(ProcedureCategory::Maintenance)
        );
        assert_eq!(
            "expert".parse::<Difficulty>(),
            Err(ProcedureError::InvalidDifficulty("expert".to_string()))
        );
        assert_eq!("share".parse::<InteractionKind>(), Ok(InteractionKind::Share));
    }

    #[test]
    fn test_new_tag_uses_default_color() {
        assert_eq!(ProcedureTag::new("Wifi", "wifi").color, "#3B82F6");
    }
}
