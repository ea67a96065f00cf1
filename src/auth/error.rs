// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication error classification.
//!
//! Identity provider failures arrive as a code string (`auth/user-disabled`)
//! plus a raw message. [`classify_auth_code`] maps the code into
//! [`AuthErrorKind`] once, and [`AuthFailure::user_message`] renders it for
//! whichever operation was in flight. Every flow goes through this table.

use super::provider::ProviderError;

/// Shared taxonomy for identity provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Wrong password or unknown credential
    InvalidCredential,
    /// No account for this email
    UserNotFound,
    /// Malformed email address
    InvalidEmail,
    /// Account exists already (sign-up)
    EmailAlreadyInUse,
    /// Password rejected by the provider's policy
    WeakPassword,
    /// Sign-in method disabled for the project
    OperationNotAllowed,
    /// Account disabled by an administrator
    UserDisabled,
    /// Provider rate limit hit
    TooManyRequests,
    /// Transport failure reaching the provider
    NetworkFailure,
    /// OAuth attempted from a domain the provider does not trust
    UnauthorizedDomain,
    /// User dismissed the OAuth consent
    PopupClosed,
    /// OAuth window could not be opened
    PopupBlocked,
    /// A second OAuth attempt replaced the first
    CancelledPopup,
    /// Anything else
    Unknown,
}

/// The operation an auth failure happened in; selects message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    EmailSignup,
    GoogleLogin,
    GoogleSignup,
    PasswordReset,
    VerificationEmail,
}

impl AuthOperation {
    pub fn label(&self) -> &'static str {
        match self {
            AuthOperation::Login => "Login",
            AuthOperation::EmailSignup => "Signup",
            AuthOperation::GoogleLogin => "Google login",
            AuthOperation::GoogleSignup => "Google sign-up",
            AuthOperation::PasswordReset => "Password reset",
            AuthOperation::VerificationEmail => "Verification email",
        }
    }

    fn is_google(&self) -> bool {
        matches!(self, AuthOperation::GoogleLogin | AuthOperation::GoogleSignup)
    }
}

/// Map a provider error code to the shared taxonomy.
pub fn classify_auth_code(code: &str) -> AuthErrorKind {
    match code {
        "auth/invalid-credential" | "auth/wrong-password" | "auth/invalid-login-credentials" => {
            AuthErrorKind::InvalidCredential
        }
        "auth/user-not-found" => AuthErrorKind::UserNotFound,
        "auth/invalid-email" => AuthErrorKind::InvalidEmail,
        "auth/email-already-in-use" => AuthErrorKind::EmailAlreadyInUse,
        "auth/weak-password" => AuthErrorKind::WeakPassword,
        "auth/operation-not-allowed" => AuthErrorKind::OperationNotAllowed,
        "auth/user-disabled" => AuthErrorKind::UserDisabled,
        "auth/too-many-requests" => AuthErrorKind::TooManyRequests,
        "auth/network-request-failed" => AuthErrorKind::NetworkFailure,
        "auth/unauthorized-domain" => AuthErrorKind::UnauthorizedDomain,
        "auth/popup-closed-by-user" => AuthErrorKind::PopupClosed,
        "auth/popup-blocked" => AuthErrorKind::PopupBlocked,
        "auth/cancelled-popup-request" => AuthErrorKind::CancelledPopup,
        _ => AuthErrorKind::Unknown,
    }
}

/// A classified identity provider failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({code})")]
pub struct AuthFailure {
    pub kind: AuthErrorKind,
    pub code: String,
    pub message: String,
}

impl AuthFailure {
    /// Render the failure for the operation it happened in.
    ///
    /// Unrecognised codes fall back to `"{operation} failed: {raw message}"`.
    pub fn user_message(&self, operation: AuthOperation) -> String {
        let action = if operation == AuthOperation::GoogleSignup {
            "sign-up"
        } else {
            "login"
        };

        match self.kind {
            AuthErrorKind::UserNotFound if operation == AuthOperation::PasswordReset => {
                "No account found with this email address. Please check the email or sign up for a new account.".to_string()
            }
            AuthErrorKind::InvalidCredential | AuthErrorKind::UserNotFound => {
                "Invalid email or password. Please check your credentials.".to_string()
            }
            AuthErrorKind::InvalidEmail => "Please enter a valid email address.".to_string(),
            AuthErrorKind::EmailAlreadyInUse => {
                "This email is already registered. Please log in instead.".to_string()
            }
            AuthErrorKind::WeakPassword => {
                "Password must be at least 6 characters long.".to_string()
            }
            AuthErrorKind::OperationNotAllowed => {
                "Email signup is not enabled for this project.".to_string()
            }
            AuthErrorKind::UserDisabled => {
                "This account has been disabled. Please contact support.".to_string()
            }
            AuthErrorKind::TooManyRequests => match operation {
                AuthOperation::PasswordReset => {
                    "Too many password reset requests. Please wait a few minutes before trying again.".to_string()
                }
                AuthOperation::VerificationEmail => {
                    "Too many email requests. Please wait a few minutes before trying again.".to_string()
                }
                _ => "Too many failed attempts. Please wait a few minutes and try again.".to_string(),
            },
            AuthErrorKind::NetworkFailure => {
                "Network error. Please check your connection and try again.".to_string()
            }
            AuthErrorKind::UnauthorizedDomain => {
                "This domain is not authorized for Google sign-in. Add it to the identity provider's authorized domains and try again.".to_string()
            }
            AuthErrorKind::PopupClosed if operation.is_google() => {
                format!("Google {action} was cancelled. Please try again.")
            }
            AuthErrorKind::PopupBlocked if operation.is_google() => {
                "Pop-up blocked! Please allow pop-ups for this site and try again.".to_string()
            }
            AuthErrorKind::CancelledPopup if operation.is_google() => {
                format!("Only one {action} attempt at a time. Please try again.")
            }
            _ => format!("{} failed: {}", operation.label(), self.message),
        }
    }
}

impl From<ProviderError> for AuthFailure {
    fn from(err: ProviderError) -> Self {
        Self {
            kind: classify_auth_code(&err.code),
            code: err.code,
            message: err.message,
        }
    }
}
