use serde::{Deserialize, Serialize};

/// Profile of the signed-in admin, cached next to the token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Authenticated session passed through every API call
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Session {
    /// Create a session with just a bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    /// Create a session with the cached user profile
    pub fn with_user(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: token.into(),
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// Value of the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.trim())
    }

    /// Name used in log lines
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.name.as_deref().or(u.email.as_deref()))
            .unwrap_or("unknown admin")
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::with_user(
            "tok-123",
            UserProfile {
                id: Some("1".to_string()),
                name: None,
                email: Some("ops@example.com".to_string()),
                role: Some("admin".to_string()),
            },
        );

        assert!(session.is_authenticated());
        assert_eq!(session.bearer(), "Bearer tok-123");
        assert_eq!(session.display_name(), "ops@example.com");
        assert!(!format!("{:?}", session).contains("tok-123"));
    }

    #[test]
    fn test_blank_token_is_not_authenticated() {
        assert!(!Session::new("   ").is_authenticated());
    }
}
