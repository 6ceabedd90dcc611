//! User status document returned by the backend's role-check endpoint.
//!
//! Mirrors the backend JSON closely. Everything below the top level is
//! optional because the backend omits the profile for accounts that never
//! completed onboarding, and omits the role for profiles without one.
//!
//! # Example
//! ```json
//! {
//!   "username": "jdelacruz",
//!   "email": "jdelacruz@example.edu",
//!   "is_staff": false,
//!   "is_superuser": false,
//!   "is_active": true,
//!   "profile": {
//!     "student_id": "2021-00123",
//!     "course": "BSIT",
//!     "year_level": 3,
//!     "role": {
//!       "name": "Manager",
//!       "description": "Canteen manager",
//!       "permissions": [{ "code": "orders.view", "label": "View orders" }]
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Server-side view of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatus {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl UserStatus {
    pub fn role(&self) -> Option<&Role> {
        self.profile.as_ref().and_then(|p| p.role.as_ref())
    }

    /// True iff the user's role lists a permission with exactly this code.
    pub fn has_permission(&self, code: &str) -> bool {
        self.role()
            .is_some_and(|role| role.permissions.iter().any(|p| p.code == code))
    }

    /// True iff the user's role name equals `name` (case-sensitive).
    pub fn has_role(&self, name: &str) -> bool {
        self.role().is_some_and(|role| role.name == name)
    }
}

/// Academic profile plus the assigned role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub year_level: Option<serde_json::Value>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub code: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_role_document() {
        let status: UserStatus = serde_json::from_value(serde_json::json!({
            "profile": { "role": { "name": "Manager", "permissions": [{ "code": "orders.view" }] } }
        }))
        .unwrap();

        assert!(status.has_permission("orders.view"));
        assert!(!status.has_permission("orders.delete"));
        assert!(status.has_role("Manager"));
        assert!(!status.has_role("manager"));
        assert!(!status.has_role("Admin"));
    }

    #[test]
    fn missing_profile_or_role_grants_nothing() {
        let no_profile: UserStatus =
            serde_json::from_value(serde_json::json!({ "username": "a", "is_active": true }))
                .unwrap();
        assert!(!no_profile.has_permission("orders.view"));
        assert!(!no_profile.has_role(""));

        let no_role: UserStatus = serde_json::from_value(serde_json::json!({
            "profile": { "student_id": "2021-1", "year_level": "3rd" }
        }))
        .unwrap();
        assert!(no_role.role().is_none());
        assert!(!no_role.has_role("Manager"));
    }

    #[test]
    fn rejects_role_without_name() {
        let parsed = serde_json::from_value::<UserStatus>(serde_json::json!({
            "profile": { "role": { "permissions": [] } }
        }));
        assert!(parsed.is_err());
    }
}
