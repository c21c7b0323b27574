use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use helpdesk_core::accounts::{ClientProfile, Profile, Specialty, TechnicianProfile, User, UserType};
use helpdesk_core::media::CloudinaryUrlBuilder;
use helpdesk_core::ratings::RatingSummary;
use helpdesk_core::serde::deserialize_optional_string;

/// Request payload for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub email_verified: bool,
}

impl CreateUser {
    /// Builds the user, with the superuser rule applied.
    pub fn into_user(self) -> User {
        let mut user = User::new(self.username.trim(), self.email.trim(), self.user_type)
            .with_name(self.first_name, self.last_name)
            .with_superuser(self.is_superuser);
        user.phone = self.phone;
        user.avatar = self.avatar;
        user.bio = self.bio;
        user.email_verified = self.email_verified;
        user
    }
}

/// Partial update of a user. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub phone: Option<String>,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub email_verified: Option<bool>,
}

impl UpdateUser {
    /// Applies the update and re-applies the superuser rule.
    pub fn apply_to(self, user: &mut User) {
        user.updated_at = Utc::now();

        if let Some(username) = self.username {
            user.username = username.trim().to_string();
        }
        if let Some(email) = self.email {
            user.email = email.trim().to_string();
        }
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(user_type) = self.user_type {
            user.user_type = user_type;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio);
        }
        if let Some(is_superuser) = self.is_superuser {
            user.is_superuser = is_superuser;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(email_verified) = self.email_verified {
            user.email_verified = email_verified;
        }
        user.enforce_superuser_role();
    }
}

/// Request payload for creating a client: user fields plus the company.
#[derive(Debug, Deserialize)]
pub struct CreateClient {
    #[serde(flatten)]
    pub user: CreateUser,
    pub company: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClient {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(flatten)]
    pub user: UpdateUser,
}

/// Request payload for creating a technician. The specialty is required.
#[derive(Debug, Deserialize)]
pub struct CreateTechnician {
    #[serde(flatten)]
    pub user: CreateUser,
    #[serde(default)]
    pub specialty: Option<Specialty>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTechnician {
    #[serde(default)]
    pub specialty: Option<Specialty>,
    #[serde(flatten)]
    pub user: UpdateUser,
}

// ============================================================================
// Response views
// ============================================================================

/// A user as returned by the API.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub avatar: Option<String>,
    pub avatar_url: Option<String>,
    pub avatar_thumbnail: Option<String>,
    pub bio: Option<String>,
    pub email_verified: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserView {
    pub fn new(user: User, media: &CloudinaryUrlBuilder) -> Self {
        let (avatar_url, avatar_thumbnail) = match user.avatar.as_deref() {
            Some(path) => {
                let (url, thumbnail) = media.avatar_urls(path);
                (Some(url), Some(thumbnail))
            }
            None => (None, None),
        };
        Self {
            full_name: user.full_name(),
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            user_type: user.user_type,
            avatar: user.avatar,
            avatar_url,
            avatar_thumbnail,
            bio: user.bio,
            email_verified: user.email_verified,
            is_superuser: user.is_superuser,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// The profile block of `/users/me`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProfileBlock {
    Client { id: Uuid, company: String },
    Technician { id: Uuid, specialty: Option<Specialty> },
}

impl From<Profile> for ProfileBlock {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Client(c) => ProfileBlock::Client {
                id: c.id,
                company: c.company,
            },
            Profile::Technician(t) => ProfileBlock::Technician {
                id: t.id,
                specialty: t.specialty,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeView {
    #[serde(flatten)]
    pub user: UserView,
    pub profile: Option<ProfileBlock>,
}

/// Short description of a user embedded in other resources.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

/// Short description of a client or technician embedded in tickets.
#[derive(Debug, Clone, Serialize)]
pub struct PartySummary {
    /// Profile id.
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl PartySummary {
    pub fn new(profile_id: Uuid, user: &User) -> Self {
        Self {
            id: profile_id,
            user_id: user.id,
            full_name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientView {
    pub id: Uuid,
    pub user: UserView,
    pub company: String,
    pub created_at: DateTime<Utc>,
    pub average_rating: f64,
    pub total_ratings: usize,
}

impl ClientView {
    pub fn new(
        client: ClientProfile,
        user: UserView,
        summary: RatingSummary,
    ) -> Self {
        Self {
            id: client.id,
            user,
            company: client.company,
            created_at: client.created_at,
            average_rating: summary.average_rating,
            total_ratings: summary.total_ratings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TechnicianView {
    pub id: Uuid,
    pub user: UserView,
    pub specialty: Option<Specialty>,
    pub specialty_display: Option<&'static str>,
    pub created_at: DateTime<Utc>,
    pub average_rating: f64,
    pub total_ratings: usize,
}

impl TechnicianView {
    pub fn new(
        technician: TechnicianProfile,
        user: UserView,
        summary: RatingSummary,
    ) -> Self {
        Self {
            id: technician.id,
            user,
            specialty: technician.specialty,
            specialty_display: technician.specialty.map(|s| s.label()),
            created_at: technician.created_at,
            average_rating: summary.average_rating,
            total_ratings: summary.total_ratings,
        }
    }
}
