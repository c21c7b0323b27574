use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::TicketError;

/// Lifecycle of a ticket: open → in_progress → resolved → closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Ouvert",
            TicketStatus::InProgress => "En cours",
            TicketStatus::Resolved => "Resolu",
            TicketStatus::Closed => "Fermee",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "resolved" => Ok(TicketStatus::Resolved),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(TicketError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketPriority::Low => "Low",
            TicketPriority::Medium => "Medium",
            TicketPriority::High => "High",
            TicketPriority::Urgent => "Urgent",
        }
    }
}

impl FromStr for TicketPriority {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            "urgent" => Ok(TicketPriority::Urgent),
            other => Err(TicketError::InvalidPriority(other.to_string())),
        }
    }
}

/// Image attached to a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketImage {
    pub id: Uuid,
    /// Storage path of the uploaded image.
    pub image: String,
    pub uploaded_at: DateTime<Utc>,
}

impl TicketImage {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            image: image.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// A support request filed on behalf of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    /// Human readable code, `TKT-N001-2024`. Assigned once at creation.
    pub code: String,
    pub title: String,
    pub description: String,
    pub material_name: Option<String>,
    pub problem_start_date: Option<DateTime<Utc>>,
    pub problem_type: Option<String>,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub tags: Option<String>,
    /// Storage path of a single attached file.
    pub attachment: Option<String>,
    /// Client profile ID.
    pub client_id: Uuid,
    /// Technician profile ID.
    pub technician_id: Option<Uuid>,
    pub images: Vec<TicketImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Creates an open, medium priority ticket without a code.
    pub fn new(client_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: String::new(),
            title: title.into(),
            description: description.into(),
            material_name: None,
            problem_start_date: None,
            problem_type: None,
            status: TicketStatus::default(),
            priority: TicketPriority::default(),
            tags: None,
            attachment: None,
            client_id,
            technician_id: None,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: TicketPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_technician(mut self, technician_id: Uuid) -> Self {
        self.technician_id = Some(technician_id);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }
}

/// Which tickets an actor is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketScope {
    All,
    /// Tickets filed by this client profile.
    Client(Uuid),
    /// Tickets assigned to this technician profile.
    Technician(Uuid),
    /// Nothing: the actor has no usable profile.
    Nothing,
}

impl TicketScope {
    pub fn includes(&self, ticket: &Ticket) -> bool {
        match self {
            TicketScope::All => true,
            TicketScope::Client(id) => ticket.client_id == *id,
            TicketScope::Technician(id) => ticket.technician_id == Some(*id),
            TicketScope::Nothing => false,
        }
    }
}
