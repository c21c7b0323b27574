use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::media::CloudinaryUrlBuilder;
use helpdesk_core::serde::{
    deserialize_nullable_uuid, deserialize_optional_datetime, deserialize_optional_string,
};
use helpdesk_core::tickets::{Ticket, TicketImage, TicketPriority, TicketStatus};

use super::user::PartySummary;

/// Request payload for filing a ticket.
///
/// `client_id` is only read for admin actors; clients always file on
/// their own profile.
#[derive(Debug, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub technician_id: Option<Uuid>,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub material_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub problem_start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub problem_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub attachment: Option<String>,
    /// Storage paths of uploaded images.
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateTicket {
    /// Builds the ticket for `client_id`. The code is assigned later.
    pub fn into_ticket(self, client_id: Uuid) -> Ticket {
        let mut ticket = Ticket::new(client_id, self.title.trim(), self.description)
            .with_priority(self.priority)
            .with_status(self.status);
        ticket.technician_id = self.technician_id;
        ticket.material_name = self.material_name;
        ticket.problem_start_date = self.problem_start_date;
        ticket.problem_type = self.problem_type;
        ticket.tags = self.tags;
        ticket.attachment = self.attachment;
        ticket.images = self.images.into_iter().map(TicketImage::new).collect();
        ticket
    }
}

/// Partial update of a ticket. The code is not updatable.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicket {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    /// `null` unassigns.
    #[serde(default, deserialize_with = "deserialize_nullable_uuid")]
    pub technician_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub material_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub problem_start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub problem_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub tags: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub attachment: Option<String>,
    /// Replaces the image set when present.
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

impl UpdateTicket {
    pub fn apply_to(self, ticket: &mut Ticket) {
        ticket.updated_at = Utc::now();

        if let Some(title) = self.title {
            ticket.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            ticket.description = description;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
        if let Some(technician_id) = self.technician_id {
            ticket.technician_id = technician_id;
        }
        if let Some(material_name) = self.material_name {
            ticket.material_name = Some(material_name);
        }
        if let Some(problem_start_date) = self.problem_start_date {
            ticket.problem_start_date = Some(problem_start_date);
        }
        if let Some(problem_type) = self.problem_type {
            ticket.problem_type = Some(problem_type);
        }
        if let Some(tags) = self.tags {
            ticket.tags = Some(tags);
        }
        if let Some(attachment) = self.attachment {
            ticket.attachment = Some(attachment);
        }
        if let Some(images) = self.images {
            ticket.images = images.into_iter().map(TicketImage::new).collect();
        }
    }
}

/// Query parameters for listing tickets.
#[derive(Debug, Default, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Serialize)]
pub struct TicketImageView {
    pub id: Uuid,
    pub image: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub uploaded_at: DateTime<Utc>,
}

impl TicketImageView {
    fn new(image: TicketImage, media: &CloudinaryUrlBuilder) -> Self {
        let urls = media.image_urls(&image.image, None);
        Self {
            id: image.id,
            image: image.image,
            image_url: urls.image_url,
            thumbnail_url: urls.thumbnail_url,
            uploaded_at: image.uploaded_at,
        }
    }
}

/// A ticket as returned by the API.
#[derive(Debug, Serialize)]
pub struct TicketView {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub material_name: Option<String>,
    pub problem_start_date: Option<DateTime<Utc>>,
    pub problem_type: Option<String>,
    pub status: TicketStatus,
    pub status_display: &'static str,
    pub priority: TicketPriority,
    pub priority_display: &'static str,
    pub tags: Option<String>,
    pub attachment: Option<String>,
    pub client_id: Uuid,
    pub client: Option<PartySummary>,
    pub technician_id: Option<Uuid>,
    pub technician: Option<PartySummary>,
    pub images: Vec<TicketImageView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TicketView {
    pub fn new(
        ticket: Ticket,
        client: Option<PartySummary>,
        technician: Option<PartySummary>,
        media: &CloudinaryUrlBuilder,
    ) -> Self {
        Self {
            id: ticket.id,
            code: ticket.code,
            title: ticket.title,
            description: ticket.description,
            material_name: ticket.material_name,
            problem_start_date: ticket.problem_start_date,
            problem_type: ticket.problem_type,
            status: ticket.status,
            status_display: ticket.status.label(),
            priority: ticket.priority,
            priority_display: ticket.priority.label(),
            tags: ticket.tags,
            attachment: ticket.attachment,
            client_id: ticket.client_id,
            client,
            technician_id: ticket.technician_id,
            technician,
            images: ticket
                .images
                .into_iter()
                .map(|image| TicketImageView::new(image, media))
                .collect(),
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}
