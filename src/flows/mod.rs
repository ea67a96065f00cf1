// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User-facing flows.
//!
//! Each flow takes the [`AppState`] and, once signed in, an explicit
//! [`Session`]. Any error after a successful sign-in ends the session before
//! it is returned, so a failed flow never leaves the user half logged in.

pub mod login;
pub mod provisioning;
pub mod signup;
pub mod transfer;

use tracing::warn;

use crate::auth::Session;
use crate::state::AppState;

pub use login::{
    login, login_with_google, resend_verification, send_password_reset, LoggedIn, LoginOutcome,
    LoginRequest, LoginStage, ResendOutcome, VerificationResend,
};
pub use provisioning::{provision_user, NewIdentity};
pub use signup::{
    sign_up_with_email, sign_up_with_google, EmailSignup, EmailSignupOutcome, GoogleSignupOutcome,
};
pub use transfer::{send_tokens, TransferProgress, TransferReceipt, TransferRequest};

/// Sign out, logging rather than returning a failure.
pub(crate) async fn end_session(state: &AppState, session: Session) {
    let uid = session.uid().to_string();
    if let Err(e) = state.identity.sign_out(session).await {
        warn!(uid = %uid, error = %e, "Sign-out failed");
    }
}
