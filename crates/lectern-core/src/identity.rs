//! External identity session contract
//!
//! The store trusts an external identity provider and consumes only its
//! user-identity fields: a stable id plus optional email, display name, and
//! avatar URL. Credentials never pass through here. Reconciliation with the
//! local User record happens in [`crate::store::Store::sync_session`],
//! called whenever the session value changes.

use serde::{Deserialize, Serialize};

use crate::models::User;

/// The logged-in identity, as reported by the external provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    /// Stable unique id for this identity
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl SessionUser {
    /// Create a session identity with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
            avatar_url: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

impl From<&SessionUser> for User {
    /// Synthesize a fresh local record for a session seen for the first time
    fn from(session: &SessionUser) -> Self {
        let mut user = User::new(session.id.clone());
        user.email = session.email.clone();
        user.display_name = session.display_name.clone();
        user.avatar_url = session.avatar_url.clone();
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let session = SessionUser::new("u1")
            .with_email("a@x.com")
            .with_display_name("Ada");

        assert_eq!(session.id, "u1");
        assert_eq!(session.email.as_deref(), Some("a@x.com"));
        assert_eq!(session.display_name.as_deref(), Some("Ada"));
        assert!(session.avatar_url.is_none());
    }

    #[test]
    fn test_user_from_session() {
        let session = SessionUser::new("u1").with_email("a@x.com");
        let user = User::from(&session);

        assert_eq!(user.id, "u1");
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
        assert!(user.preferences.is_empty());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_session_serialization() {
        let session = SessionUser::new("u1").with_avatar_url("https://x.com/a.png");
        let json = serde_json::to_string(&session).unwrap();
        let back: SessionUser = serde_json::from_str(&json).unwrap();
        assert_eq!(session, back);
    }
}
