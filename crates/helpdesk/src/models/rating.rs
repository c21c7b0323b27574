use serde::{Deserialize, Serialize};

use helpdesk_core::ratings::{summarize, ClientRating, RatingSummary, TechnicianRating};
use helpdesk_core::serde::deserialize_optional_string;

#[derive(Debug, Deserialize)]
pub struct CreateRating {
    pub rating: u8,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub comment: Option<String>,
}

/// Ratings received by one profile, with their aggregate.
#[derive(Debug, Serialize)]
pub struct RatingsView<T> {
    pub average_rating: f64,
    pub total_ratings: usize,
    pub ratings: Vec<T>,
}

impl<T> RatingsView<T> {
    pub fn new(ratings: Vec<T>, score: impl Fn(&T) -> u8) -> Self {
        let scores: Vec<u8> = ratings.iter().map(score).collect();
        let RatingSummary {
            average_rating,
            total_ratings,
        } = summarize(&scores);
        Self {
            average_rating,
            total_ratings,
            ratings,
        }
    }
}

/// Ratings received by the acting user's profile.
///
/// Users without a profile get an empty object.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReceivedRatings {
    Client(RatingsView<ClientRating>),
    Technician(RatingsView<TechnicianRating>),
    Nothing(serde_json::Map<String, serde_json::Value>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ratings_view_summarizes() {
        let technician = Uuid::new_v4();
        let ratings = vec![
            TechnicianRating::new(technician, Uuid::new_v4(), 4, None),
            TechnicianRating::new(technician, Uuid::new_v4(), 5, Some("Fast".to_string())),
        ];

        let view = RatingsView::new(ratings, |r| r.rating);

        assert_eq!(view.total_ratings, 2);
        assert!((view.average_rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_ratings_average_zero() {
        let view = RatingsView::<TechnicianRating>::new(Vec::new(), |r| r.rating);

        assert_eq!(view.total_ratings, 0);
        assert_eq!(view.average_rating, 0.0);
    }

    #[test]
    fn test_received_nothing_is_empty_object() {
        let json = serde_json::to_value(ReceivedRatings::Nothing(Default::default())).unwrap();

        assert_eq!(json, serde_json::json!({}));
    }
}
