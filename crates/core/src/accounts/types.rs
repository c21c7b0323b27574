use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AccountError;

/// Role carried by every account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Admin,
    Technician,
    #[default]
    Client,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::Technician => "technician",
            UserType::Client => "client",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserType::Admin),
            "technician" => Ok(UserType::Technician),
            "client" => Ok(UserType::Client),
            other => Err(AccountError::InvalidUserType(other.to_string())),
        }
    }
}

/// Technician field of expertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Hardware,
    Software,
    Network,
    Security,
}

impl Specialty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::Hardware => "hardware",
            Specialty::Software => "software",
            Specialty::Network => "network",
            Specialty::Security => "security",
        }
    }

    /// Human readable label shown in the support UI.
    pub fn label(&self) -> &'static str {
        match self {
            Specialty::Hardware => "Matériel",
            Specialty::Software => "Logiciel",
            Specialty::Network => "Réseau",
            Specialty::Security => "Sécurité",
        }
    }
}

impl FromStr for Specialty {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hardware" => Ok(Specialty::Hardware),
            "software" => Ok(Specialty::Software),
            "network" => Ok(Specialty::Network),
            "security" => Ok(Specialty::Security),
            other => Err(AccountError::InvalidSpecialty(other.to_string())),
        }
    }
}

/// An account: admin, technician or client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    /// Storage path of the avatar image (e.g. `avatars/<id>/<uuid>.jpg`).
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub email_verified: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active user with the given role.
    ///
    /// The superuser rule is applied by [`User::with_superuser`].
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: email.into(),
            phone: None,
            user_type,
            avatar: None,
            bio: None,
            email_verified: false,
            is_superuser: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Marks the user as superuser, which always makes it an admin.
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self.enforce_superuser_role();
        self
    }

    /// Sets a specific ID for this user (useful for testing).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Superusers are always stored as admins.
    pub fn enforce_superuser_role(&mut self) {
        if self.is_superuser {
            self.user_type = UserType::Admin;
        }
    }

    /// "first last", trimmed. Empty when neither name is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

/// Client extension of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

impl ClientProfile {
    pub fn new(user_id: Uuid, company: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            company: company.into(),
            created_at: Utc::now(),
        }
    }
}

/// Technician extension of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicianProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Unset on profiles created implicitly with the account.
    pub specialty: Option<Specialty>,
    pub created_at: DateTime<Utc>,
}

impl TechnicianProfile {
    pub fn new(user_id: Uuid, specialty: Option<Specialty>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            specialty,
            created_at: Utc::now(),
        }
    }
}

/// The role-specific profile attached to a user, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Client(ClientProfile),
    Technician(TechnicianProfile),
}

impl Profile {
    pub fn id(&self) -> Uuid {
        match self {
            Profile::Client(c) => c.id,
            Profile::Technician(t) => t.id,
        }
    }

    pub fn as_client(&self) -> Option<&ClientProfile> {
        match self {
            Profile::Client(c) => Some(c),
            Profile::Technician(_) => None,
        }
    }

    pub fn as_technician(&self) -> Option<&TechnicianProfile> {
        match self {
            Profile::Technician(t) => Some(t),
            Profile::Client(_) => None,
        }
    }
}
