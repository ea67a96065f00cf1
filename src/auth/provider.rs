// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity provider seam and the explicit session type.
//!
//! Flows never reach for an ambient "current user": a [`Session`] is returned
//! by sign-in and passed into every operation that needs one.

use async_trait::async_trait;

/// Error returned by an [`IdentityProvider`]; `code` uses `auth/...` codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({code})")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Transport failure reaching the provider.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new("auth/network-request-failed", message)
    }
}

/// Profile of an authenticated identity as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityUser {
    /// Provider user id; the key of the user's record
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    pub user: IdentityUser,
    pub id_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn uid(&self) -> &str {
        &self.user.uid
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Credential obtained from an OAuth provider outside this crate.
#[derive(Clone)]
pub enum OAuthCredential {
    /// Google ID token (from Google Identity Services or a device flow)
    Google { id_token: String },
}

impl OAuthCredential {
    pub fn provider_id(&self) -> &'static str {
        match self {
            OAuthCredential::Google { .. } => "google.com",
        }
    }
}

/// Profile fields to change; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Managed identity service: credentials, verification, OAuth.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError>;

    async fn sign_in_with_oauth(
        &self,
        credential: &OAuthCredential,
    ) -> Result<Session, ProviderError>;

    async fn send_verification_email(&self, session: &Session) -> Result<(), ProviderError>;

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError>;

    /// Fetch the latest profile (notably `email_verified`).
    async fn reload(&self, session: &Session) -> Result<IdentityUser, ProviderError>;

    async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError>;

    /// End the session. Consumes it so it cannot be reused.
    async fn sign_out(&self, session: Session) -> Result<(), ProviderError>;
}
