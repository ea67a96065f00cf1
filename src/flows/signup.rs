// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account creation: email/password and Google.

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::end_session;
use super::provisioning::{provision_user, NewIdentity};
use crate::auth::{AuthFailure, AuthOperation, OAuthCredential, ProfileUpdate, Session};
use crate::error::AppError;
use crate::models::{derive_username, AuthProvider, ProvisionedWallet};
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct EmailSignup<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// Falls back to the email's local part when blank
    pub username: &'a str,
}

/// A new email account. The session is signed out; the user logs in once the
/// address is verified.
#[derive(Debug)]
pub struct EmailSignupOutcome {
    pub uid: String,
    pub email: String,
    pub wallet: ProvisionedWallet,
    /// Why the verification email could not be sent, if it was not
    pub verification_error: Option<AuthFailure>,
}

#[derive(Debug)]
pub enum GoogleSignupOutcome {
    Created {
        session: Session,
        wallet: ProvisionedWallet,
    },
    /// A record already exists for this identity; nothing was changed
    AlreadyRegistered { session: Session },
}

pub async fn sign_up_with_email(
    state: &AppState,
    request: &EmailSignup<'_>,
) -> Result<EmailSignupOutcome, AppError> {
    let span = info_span!("signup", flow_id = %Uuid::new_v4(), provider = "email");
    sign_up_with_email_inner(state, request)
        .instrument(span)
        .await
}

async fn sign_up_with_email_inner(
    state: &AppState,
    request: &EmailSignup<'_>,
) -> Result<EmailSignupOutcome, AppError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::MissingCredentials);
    }
    let username = derive_username(Some(request.username), None, email);

    let session = state
        .identity
        .create_account(email, request.password)
        .await
        .map_err(|e| AppError::auth(AuthOperation::EmailSignup, e))?;
    info!(uid = %session.uid(), "Account created");

    let profile = ProfileUpdate {
        display_name: Some(username.clone()),
        photo_url: None,
    };
    if let Err(e) = state.identity.update_profile(&session, &profile).await {
        end_session(state, session).await;
        return Err(AppError::auth(AuthOperation::EmailSignup, e));
    }

    let identity = NewIdentity {
        uid: session.uid(),
        email,
        username: &username,
        photo_url: None,
        auth_provider: AuthProvider::Email,
        email_verified: session.user.email_verified,
    };
    let wallet = match provision_user(state, &identity).await {
        Ok(wallet) => wallet,
        Err(e) => {
            end_session(state, session).await;
            return Err(e);
        }
    };

    let verification_error = match state.identity.send_verification_email(&session).await {
        Ok(()) => {
            info!(uid = %session.uid(), "Verification email sent");
            None
        }
        Err(e) => {
            warn!(uid = %session.uid(), error = %e, "Verification email not sent");
            Some(AuthFailure::from(e))
        }
    };

    let uid = session.uid().to_string();
    end_session(state, session).await;

    Ok(EmailSignupOutcome {
        uid,
        email: email.to_string(),
        wallet,
        verification_error,
    })
}

pub async fn sign_up_with_google(
    state: &AppState,
    credential: &OAuthCredential,
) -> Result<GoogleSignupOutcome, AppError> {
    let span = info_span!("signup", flow_id = %Uuid::new_v4(), provider = "google");
    sign_up_with_google_inner(state, credential)
        .instrument(span)
        .await
}

async fn sign_up_with_google_inner(
    state: &AppState,
    credential: &OAuthCredential,
) -> Result<GoogleSignupOutcome, AppError> {
    let session = state
        .identity
        .sign_in_with_oauth(credential)
        .await
        .map_err(|e| AppError::auth(AuthOperation::GoogleSignup, e))?;

    let exists = match state.store.exists(session.uid()).await {
        Ok(exists) => exists,
        Err(e) => {
            end_session(state, session).await;
            return Err(e.into());
        }
    };
    if exists {
        info!(uid = %session.uid(), "Google identity already registered");
        return Ok(GoogleSignupOutcome::AlreadyRegistered { session });
    }

    let user = &session.user;
    let username = derive_username(None, user.display_name.as_deref(), &user.email);
    let identity = NewIdentity {
        uid: &user.uid,
        email: &user.email,
        username: &username,
        photo_url: user.photo_url.as_deref(),
        auth_provider: AuthProvider::Google,
        email_verified: true,
    };
    let provisioned = provision_user(state, &identity).await;

    match provisioned {
        Ok(wallet) => Ok(GoogleSignupOutcome::Created { session, wallet }),
        Err(e) => {
            end_session(state, session).await;
            Err(e)
        }
    }
}
