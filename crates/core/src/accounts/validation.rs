use std::sync::LazyLock;

use regex::Regex;

use super::error::AccountError;
use super::types::{ClientProfile, Profile, TechnicianProfile, User, UserType};

/// Congolese numbers with an optional `+` and optional `242` prefix.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?242?\d{8,15}$").expect("phone pattern is valid"));

const PHONE_MAX_LEN: usize = 13;

/// Validates a phone number against the accepted format.
pub fn validate_phone(phone: &str) -> Result<(), AccountError> {
    if phone.chars().count() > PHONE_MAX_LEN || !PHONE_RE.is_match(phone) {
        return Err(AccountError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}

/// Minimal shape check: one `@` with something on both sides.
pub fn validate_email(email: &str) -> Result<(), AccountError> {
    let mut parts = email.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.trim().is_empty() && !domain.trim().is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AccountError::InvalidEmail(email.to_string()))
    }
}

/// Trims the company name and rejects blank values.
pub fn normalize_company(company: &str) -> Result<String, AccountError> {
    let trimmed = company.trim();
    if trimmed.is_empty() {
        return Err(AccountError::EmptyCompany);
    }
    Ok(trimmed.to_string())
}

/// Validates a user before creation or update.
pub fn validate_user(user: &User) -> Result<(), AccountError> {
    if user.username.trim().is_empty() {
        return Err(AccountError::EmptyUsername);
    }
    validate_email(&user.email)?;
    if let Some(phone) = user.phone.as_deref() {
        validate_phone(phone)?;
    }
    Ok(())
}

/// Builds the profile that is created together with a new account.
///
/// Admins have no profile. Client companies and technician specialties
/// start empty and are filled in by the dedicated client/technician flows.
pub fn default_profile_for(user: &User) -> Option<Profile> {
    match user.user_type {
        UserType::Client => Some(Profile::Client(ClientProfile::new(user.id, ""))),
        UserType::Technician => Some(Profile::Technician(TechnicianProfile::new(user.id, None))),
        UserType::Admin => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Specialty;

    #[test]
    fn test_validate_phone_accepts_local_formats() {
        assert!(validate_phone("+242055506688").is_ok());
        assert!(validate_phone("24055506688").is_ok());
        assert!(validate_phone("2455506688").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_bad_values() {
        assert!(validate_phone("055506688").is_err());
        assert!(validate_phone("+24205550668899").is_err()); // too long
        assert!(validate_phone("+242 05550668").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("jane.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_normalize_company_trims() {
        assert_eq!(normalize_company("  ACME  ").unwrap(), "ACME");
        assert_eq!(normalize_company("   "), Err(AccountError::EmptyCompany));
    }

    #[test]
    fn test_validate_user_checks_phone() {
        let user = User::new("jane", "jane@example.com", UserType::Client).with_phone("abc");
        assert!(matches!(
            validate_user(&user),
            Err(AccountError::InvalidPhone(_))
        ));
    }

    #[test]
    fn test_validate_user_requires_username() {
        let user = User::new("  ", "jane@example.com", UserType::Client);
        assert_eq!(validate_user(&user), Err(AccountError::EmptyUsername));
    }

    #[test]
    fn test_superuser_is_forced_to_admin() {
        let user = User::new("root", "root@example.com", UserType::Client).with_superuser(true);
        assert_eq!(user.user_type, UserType::Admin);
        assert!(default_profile_for(&user).is_none());
    }

    #[test]
    fn test_default_profile_matches_role() {
        let client = User::new("c", "c@example.com", UserType::Client);
        let profile = default_profile_for(&client).unwrap();
        assert_eq!(profile.as_client().map(|c| c.user_id), Some(client.id));

        let tech = User::new("t", "t@example.com", UserType::Technician);
        let profile = default_profile_for(&tech).unwrap();
        let tech_profile = profile.as_technician().unwrap();
        assert_eq!(tech_profile.user_id, tech.id);
        assert_eq!(tech_profile.specialty, None::<Specialty>);
    }

    #[test]
    fn test_full_name_trims_missing_parts() {
        let user = User::new("jane", "jane@example.com", UserType::Client).with_name("Jane", "");
        assert_eq!(user.full_name(), "Jane");
    }
}
