mod error;
mod operations;
mod types;

pub use error::{intervention_error_to_status_code, InterventionError};
pub use operations::{
    generate_intervention_code, intervention_code_from, recompute_totals, sort_interventions,
    validate_intervention,
};
pub use types::{
    status_color, Intervention, InterventionExpense, InterventionImage, InterventionMaterial,
    InterventionStatus,
};
