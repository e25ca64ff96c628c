//! The signed-in user's profile.

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, as parsed from a profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user id (may be empty when the payload carried none).
    pub id: String,
    /// Email address.
    pub email: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL.
    pub profile_image: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

impl UserProfile {
    /// Creates a profile with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Name to show in the UI.
    ///
    /// Full name, else first name, else the local part of the email, else
    /// `"User"`. Blank fields are skipped.
    pub fn display_name(&self) -> String {
        let first = non_blank(self.first_name.as_deref());
        let last = non_blank(self.last_name.as_deref());
        let email = non_blank(self.email.as_deref());

        match (first, last, email) {
            (Some(first), Some(last), _) => format!("{first} {last}"),
            (Some(first), None, _) => first.to_string(),
            (None, _, Some(email)) => email.split('@').next().unwrap_or(email).to_string(),
            _ => "User".to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_full_name() {
        let user = UserProfile {
            first_name: Some("John".into()),
            last_name: Some("Doe".into()),
            ..UserProfile::new("1")
        };
        assert_eq!(user.display_name(), "John Doe");
    }

    #[test]
    fn test_display_name_first_name_only() {
        let user = UserProfile {
            first_name: Some("Jane".into()),
            email: Some("jane@example.com".into()),
            ..UserProfile::new("1")
        };
        assert_eq!(user.display_name(), "Jane");
    }

    #[test]
    fn test_display_name_email_prefix() {
        let user = UserProfile {
            first_name: Some(String::new()),
            last_name: Some(String::new()),
            email: Some("test@test.com".into()),
            ..UserProfile::new("1")
        };
        assert_eq!(user.display_name(), "test");
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(UserProfile::new("1").display_name(), "User");
    }
}
