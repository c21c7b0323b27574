use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client's rating of a technician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianRating {
    pub id: Uuid,
    /// Rated technician profile.
    pub technician_id: Uuid,
    /// Rating client profile.
    pub client_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TechnicianRating {
    pub fn new(technician_id: Uuid, client_id: Uuid, rating: u8, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            technician_id,
            client_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// A technician's rating of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRating {
    pub id: Uuid,
    /// Rated client profile.
    pub client_id: Uuid,
    /// Rating technician profile.
    pub technician_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClientRating {
    pub fn new(client_id: Uuid, technician_id: Uuid, rating: u8, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            technician_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// Aggregate of the ratings a profile received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_ratings: usize,
}
