//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Application-wide role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Gender as recorded on the profile. Unrecognized values read as neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    #[serde(other)]
    Neutral,
}

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth provider uid (also used as document ID)
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub gender: Gender,
    /// Birthdate (YYYY-MM-DD)
    pub birthdate: Option<String>,
    pub nationality: Option<String>,
    pub phone: Option<String>,
    /// Congregation membership, independent of family membership
    #[serde(default)]
    pub is_member: bool,
    /// Whether the person has login credentials
    #[serde(default)]
    pub has_web_access: bool,
    /// Family-group ids this user belongs to
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub profile_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Build a fresh profile for a first-time login.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, now: &str) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
            photo_url: None,
            role: Role::User,
            gender: Gender::Neutral,
            birthdate: None,
            nationality: None,
            phone: None,
            is_member: false,
            has_web_access: true,
            families: Vec::new(),
            profile_completed: false,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Case-insensitive substring match on display name or email.
    pub fn matches_query(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.display_name.to_lowercase().contains(needle_lower)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(needle_lower))
    }
}

/// Public subset of a profile, shown when picking people to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            email: user.email,
            photo_url: user.photo_url,
        }
    }
}
