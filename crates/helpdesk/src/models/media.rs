use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::interventions::InterventionImage;
use helpdesk_core::media::{split_public_id, CloudinaryUrlBuilder, ImageUrls};
use helpdesk_core::procedures::ProcedureImage;
use helpdesk_core::serde::deserialize_optional_string;

/// An already uploaded image, attached to an intervention or a procedure.
#[derive(Debug, Deserialize)]
pub struct ImageUpload {
    /// Storage path.
    pub image: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub caption: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Taken from the path when absent.
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub file_extension: Option<String>,
}

impl ImageUpload {
    /// Lowercased extension with its leading dot, `.png` when unknown.
    fn extension(&self) -> String {
        match self.file_extension.as_deref().map(str::trim) {
            Some(ext) if !ext.is_empty() => {
                format!(".{}", ext.trim_start_matches('.').to_lowercase())
            }
            _ => split_public_id(&self.image)
                .1
                .unwrap_or_else(|| ".png".to_string()),
        }
    }

    pub fn into_intervention_image(self) -> InterventionImage {
        InterventionImage {
            id: Uuid::new_v4(),
            file_extension: self.extension(),
            image: self.image,
            caption: self.caption,
            alt_text: self.alt_text,
            order: self.order,
            width: self.width,
            height: self.height,
            file_size: self.file_size,
            uploaded_at: Utc::now(),
        }
    }

    pub fn into_procedure_image(self) -> ProcedureImage {
        ProcedureImage {
            id: Uuid::new_v4(),
            file_extension: self.extension(),
            image: self.image,
            caption: self.caption,
            alt_text: self.alt_text,
            order: self.order,
            width: self.width,
            height: self.height,
            file_size: self.file_size,
            uploaded_at: Utc::now(),
        }
    }
}

/// A stored image with its delivery URLs.
#[derive(Debug, Serialize)]
pub struct ImageView {
    pub id: Uuid,
    pub image: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
    pub order: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub file_size: Option<u64>,
    pub file_extension: String,
    #[serde(flatten)]
    pub urls: ImageUrls,
    pub uploaded_at: DateTime<Utc>,
}

impl ImageView {
    pub fn from_intervention(image: InterventionImage, media: &CloudinaryUrlBuilder) -> Self {
        let urls = media.image_urls(&image.image, Some(&image.file_extension));
        Self {
            id: image.id,
            image: image.image,
            caption: image.caption,
            alt_text: image.alt_text,
            order: image.order,
            width: image.width,
            height: image.height,
            file_size: image.file_size,
            file_extension: image.file_extension,
            urls,
            uploaded_at: image.uploaded_at,
        }
    }

    pub fn from_procedure(image: ProcedureImage, media: &CloudinaryUrlBuilder) -> Self {
        let urls = media.image_urls(&image.image, Some(&image.file_extension));
        Self {
            id: image.id,
            image: image.image,
            caption: image.caption,
            alt_text: image.alt_text,
            order: image.order,
            width: image.width,
            height: image.height,
            file_size: image.file_size,
            file_extension: image.file_extension,
            urls,
            uploaded_at: image.uploaded_at,
        }
    }
}
