mod error;
mod types;
mod validation;

pub use error::{account_error_to_status_code, AccountError};
pub use types::{ClientProfile, Profile, Specialty, TechnicianProfile, User, UserType};
pub use validation::{
    default_profile_for, normalize_company, validate_email, validate_phone, validate_user,
};
