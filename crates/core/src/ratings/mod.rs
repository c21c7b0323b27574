mod error;
mod operations;
mod types;

pub use error::{rating_error_to_status_code, RatingError};
pub use operations::{
    rater_client_id, rater_technician_id, shares_closed_ticket, summarize, validate_score,
};
pub use types::{ClientRating, RatingSummary, TechnicianRating};
