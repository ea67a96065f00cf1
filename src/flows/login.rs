// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Login Flow
//!
//! ```text
//! Unauthenticated -> CredentialsSubmitted -> EmailUnverified (signed out, stop)
//!                                         -> Verified -> RecordLoaded -> BonusChecked -> LoggedIn
//! ```
//!
//! Every transition is logged inside a `login` span carrying a per-attempt
//! `flow_id`, and recorded in the outcome's stage trail. Any fatal error after
//! sign-in signs the session out before returning.
//!
//! The welcome bonus is started as a background task at `BonusChecked`; the
//! flow never waits for it.

use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::end_session;
use super::provisioning::{provision_user, NewIdentity};
use crate::auth::{AuthFailure, AuthOperation, OAuthCredential, Session};
use crate::bonus::{spawn_bonus, BonusStatus};
use crate::error::AppError;
use crate::models::{derive_username, AuthProvider, ProvisionedWallet, UserRecord, UserUpdate};
use crate::state::AppState;

/// States of the login state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Unauthenticated,
    CredentialsSubmitted,
    EmailUnverified,
    Verified,
    RecordLoaded,
    BonusChecked,
    LoggedIn,
}

#[derive(Debug, Clone)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// Send a new verification email if the address is still unverified
    pub resend_verification: bool,
}

/// A completed login.
#[derive(Debug)]
pub struct LoggedIn {
    pub session: Session,
    pub record: UserRecord,
    pub bonus: BonusStatus,
    /// Wallet created during this login (Google first sign-in only)
    pub provisioned: Option<ProvisionedWallet>,
    pub stages: Vec<LoginStage>,
}

/// Result of resending a verification email from the unverified branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResend {
    Sent,
    Failed(AuthFailure),
}

#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn(Box<LoggedIn>),
    /// Credentials were valid but the email is unverified; the session has
    /// been signed out.
    EmailUnverified {
        email: String,
        resend: Option<VerificationResend>,
        stages: Vec<LoginStage>,
    },
}

/// Outcome of [`resend_verification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    AlreadyVerified,
}

struct StageTrail(Vec<LoginStage>);

impl StageTrail {
    fn new() -> Self {
        Self(vec![LoginStage::Unauthenticated])
    }

    fn enter(&mut self, stage: LoginStage) {
        info!(stage = ?stage, "Login stage");
        self.0.push(stage);
    }
}

/// Email/password login.
pub async fn login(state: &AppState, request: &LoginRequest<'_>) -> Result<LoginOutcome, AppError> {
    let span = info_span!("login", flow_id = %Uuid::new_v4(), provider = "email");
    login_inner(state, request).instrument(span).await
}

async fn login_inner(
    state: &AppState,
    request: &LoginRequest<'_>,
) -> Result<LoginOutcome, AppError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(AppError::MissingCredentials);
    }

    let mut trail = StageTrail::new();
    trail.enter(LoginStage::CredentialsSubmitted);

    let session = state
        .identity
        .sign_in(email, request.password)
        .await
        .map_err(|e| AppError::auth(AuthOperation::Login, e))?;

    let user = match state.identity.reload(&session).await {
        Ok(user) => user,
        Err(e) => {
            return Err(abort(state, session, AppError::auth(AuthOperation::Login, e)).await)
        }
    };

    if !user.email_verified {
        trail.enter(LoginStage::EmailUnverified);

        let resend = if request.resend_verification {
            Some(match state.identity.send_verification_email(&session).await {
                Ok(()) => {
                    info!(uid = %session.uid(), "Verification email resent");
                    VerificationResend::Sent
                }
                Err(e) => {
                    warn!(uid = %session.uid(), error = %e, "Verification email not sent");
                    VerificationResend::Failed(e.into())
                }
            })
        } else {
            None
        };

        end_session(state, session).await;
        return Ok(LoginOutcome::EmailUnverified {
            email: email.to_string(),
            resend,
            stages: trail.0,
        });
    }

    trail.enter(LoginStage::Verified);
    let logged_in = complete_login(state, session, trail, None).await?;
    Ok(LoginOutcome::LoggedIn(Box::new(logged_in)))
}

/// Google login. Creates the record and wallet on first sign-in.
pub async fn login_with_google(
    state: &AppState,
    credential: &OAuthCredential,
) -> Result<LoggedIn, AppError> {
    let span = info_span!("login", flow_id = %Uuid::new_v4(), provider = "google");
    login_with_google_inner(state, credential)
        .instrument(span)
        .await
}

async fn login_with_google_inner(
    state: &AppState,
    credential: &OAuthCredential,
) -> Result<LoggedIn, AppError> {
    let mut trail = StageTrail::new();
    trail.enter(LoginStage::CredentialsSubmitted);

    let session = state
        .identity
        .sign_in_with_oauth(credential)
        .await
        .map_err(|e| AppError::auth(AuthOperation::GoogleLogin, e))?;

    // The OAuth provider has verified the address
    trail.enter(LoginStage::Verified);

    let exists = match state.store.exists(session.uid()).await {
        Ok(exists) => exists,
        Err(e) => return Err(abort(state, session, e.into()).await),
    };

    let provisioned = if exists {
        None
    } else {
        info!(uid = %session.uid(), "First Google sign-in, provisioning wallet");
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
        match provision_user(state, &identity).await {
            Ok(wallet) => Some(wallet),
            Err(e) => return Err(abort(state, session, e).await),
        }
    };

    complete_login(state, session, trail, provisioned).await
}

/// Shared tail of both logins: load the record, stamp it, check the bonus.
async fn complete_login(
    state: &AppState,
    session: Session,
    mut trail: StageTrail,
    provisioned: Option<ProvisionedWallet>,
) -> Result<LoggedIn, AppError> {
    let uid = session.uid().to_string();

    let mut record = match state.store.get(&uid).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!(uid = %uid, "Authenticated user has no record");
            return Err(abort(state, session, AppError::RecordNotFound { uid }).await);
        }
        Err(e) => return Err(abort(state, session, e.into()).await),
    };
    trail.enter(LoginStage::RecordLoaded);

    let mut updates = Vec::with_capacity(2);
    if !record.email_verified {
        updates.push(UserUpdate::EmailVerified(true));
    }
    updates.push(UserUpdate::TouchLastLogin);
    if let Err(e) = state.store.update(&uid, &updates).await {
        return Err(abort(state, session, e.into()).await);
    }
    let now = Utc::now();
    for update in &updates {
        record.apply(update, now);
    }

    let bonus = if record.bonus_given {
        BonusStatus::AlreadyGiven
    } else {
        BonusStatus::Pending(spawn_bonus(
            state.bonus.clone(),
            state.store.clone(),
            uid.clone(),
            record.wallet_address.clone(),
        ))
    };
    trail.enter(LoginStage::BonusChecked);

    trail.enter(LoginStage::LoggedIn);
    info!(uid = %uid, username = %record.username, "Logged in");

    Ok(LoggedIn {
        session,
        record,
        bonus,
        provisioned,
        stages: trail.0,
    })
}

/// Send a password reset email.
pub async fn send_password_reset(state: &AppState, email: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::MissingEmail);
    }

    state
        .identity
        .send_password_reset_email(email)
        .await
        .map_err(|e| AppError::auth(AuthOperation::PasswordReset, e))?;
    info!("Password reset email sent");
    Ok(())
}

/// Sign in, send a verification email if still needed, sign out.
pub async fn resend_verification(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<ResendOutcome, AppError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::MissingCredentials);
    }

    let session = state
        .identity
        .sign_in(email, password)
        .await
        .map_err(|e| AppError::auth(AuthOperation::VerificationEmail, e))?;

    let user = match state.identity.reload(&session).await {
        Ok(user) => user,
        Err(e) => {
            return Err(abort(
                state,
                session,
                AppError::auth(AuthOperation::VerificationEmail, e),
            )
            .await)
        }
    };

    if user.email_verified {
        end_session(state, session).await;
        return Ok(ResendOutcome::AlreadyVerified);
    }

    let sent = state.identity.send_verification_email(&session).await;
    end_session(state, session).await;
    sent.map_err(|e| AppError::auth(AuthOperation::VerificationEmail, e))?;

    info!("Verification email sent");
    Ok(ResendOutcome::Sent)
}

/// Sign out, then hand back `err`.
async fn abort(state: &AppState, session: Session, err: AppError) -> AppError {
    warn!(uid = %session.uid(), error = %err, "Login aborted");
    end_session(state, session).await;
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthErrorKind;
    use crate::bonus::BonusOutcome;
    use crate::testing::{sample_record, FakeBonus, Harness, IdentityOp};

    const WALLET: &str = "0x1111111111111111111111111111111111111111";

    fn request<'a>(email: &'a str, password: &'a str) -> LoginRequest<'a> {
        LoginRequest {
            email,
            password,
            resend_verification: false,
        }
    }

    fn logged_in(outcome: LoginOutcome) -> LoggedIn {
        match outcome {
            LoginOutcome::LoggedIn(done) => *done,
            other => panic!("expected LoggedIn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn verified_login_walks_every_stage() {
        let harness = Harness::new();
        let uid = harness.identity.add_account("ada@example.com", "secret1", true);
        harness.seed_record(&uid, sample_record(WALLET)).await;

        let done = logged_in(
            login(&harness.state(), &request("ada@example.com", "secret1"))
                .await
                .unwrap(),
        );

        assert_eq!(
            done.stages,
            vec![
                LoginStage::Unauthenticated,
                LoginStage::CredentialsSubmitted,
                LoginStage::Verified,
                LoginStage::RecordLoaded,
                LoginStage::BonusChecked,
                LoginStage::LoggedIn,
            ]
        );
        assert_eq!(done.session.uid(), uid);
        assert!(done.record.last_login.is_some());
        assert!(done.provisioned.is_none());
        assert_eq!(harness.identity.sign_outs(), 0);

        let BonusStatus::Pending(handle) = done.bonus else {
            panic!("bonus should have been attempted");
        };
        assert_eq!(handle.outcome().await, BonusOutcome::Granted);
        assert_eq!(harness.bonus.calls(), vec![WALLET.to_string()]);

        let stored = harness.record(&uid).await.unwrap();
        assert!(stored.bonus_given);
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn unverified_login_stops_before_the_record() {
        let harness = Harness::new();
        let uid = harness.identity.add_account("bob@example.com", "secret1", false);
        harness.seed_record(&uid, sample_record(WALLET)).await;

        let outcome = login(&harness.state(), &request("bob@example.com", "secret1"))
            .await
            .unwrap();

        let LoginOutcome::EmailUnverified { resend, stages, .. } = outcome else {
            panic!("expected EmailUnverified");
        };
        assert!(resend.is_none());
        assert_eq!(stages.last(), Some(&LoginStage::EmailUnverified));
        assert!(!stages.contains(&LoginStage::RecordLoaded));
        assert_eq!(harness.store.gets(), 0);
        assert!(harness.store.updates().is_empty());
        assert!(harness.bonus.calls().is_empty());
        assert_eq!(harness.identity.sign_outs(), 1);
        assert!(harness.identity.verification_emails().is_empty());
    }

    #[tokio::test]
    async fn unverified_login_can_resend_verification() {
        let harness = Harness::new();
        harness.identity.add_account("bob@example.com", "secret1", false);

        let outcome = login(
            &harness.state(),
            &LoginRequest {
                resend_verification: true,
                ..request("bob@example.com", "secret1")
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            outcome,
            LoginOutcome::EmailUnverified {
                resend: Some(VerificationResend::Sent),
                ..
            }
        ));
        assert_eq!(
            harness.identity.verification_emails(),
            vec!["bob@example.com".to_string()]
        );
        assert_eq!(harness.identity.sign_outs(), 1);
    }

    #[tokio::test]
    async fn resend_failure_is_reported_and_still_signs_out() {
        let harness = Harness::new();
        harness.identity.add_account("bob@example.com", "secret1", false);
        harness
            .identity
            .fail(IdentityOp::SendVerification, "auth/too-many-requests");

        let outcome = login(
            &harness.state(),
            &LoginRequest {
                resend_verification: true,
                ..request("bob@example.com", "secret1")
            },
        )
        .await
        .unwrap();

        let LoginOutcome::EmailUnverified {
            resend: Some(VerificationResend::Failed(failure)),
            ..
        } = outcome
        else {
            panic!("expected a failed resend");
        };
        assert_eq!(failure.kind, AuthErrorKind::TooManyRequests);
        assert_eq!(harness.identity.sign_outs(), 1);
    }

    #[tokio::test]
    async fn wrong_password_is_classified() {
        let harness = Harness::new();
        harness.identity.add_account("ada@example.com", "secret1", true);

        let err = login(&harness.state(), &request("ada@example.com", "nope"))
            .await
            .unwrap_err();

        let AppError::Auth { failure, operation } = &err else {
            panic!("expected auth error, got {err:?}");
        };
        assert_eq!(failure.kind, AuthErrorKind::InvalidCredential);
        assert_eq!(*operation, AuthOperation::Login);
        assert_eq!(
            err.user_message(),
            "Invalid email or password. Please check your credentials."
        );
        assert_eq!(harness.store.gets(), 0);
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected() {
        let harness = Harness::new();
        let err = login(&harness.state(), &request("  ", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingCredentials));
    }

    #[tokio::test]
    async fn missing_record_signs_out() {
        let harness = Harness::new();
        harness.identity.add_account("ada@example.com", "secret1", true);

        let err = login(&harness.state(), &request("ada@example.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RecordNotFound { .. }));
        assert_eq!(
            err.user_message(),
            "User data not found. Please contact support."
        );
        assert_eq!(harness.identity.sign_outs(), 1);
        assert!(harness.bonus.calls().is_empty());
    }

    #[tokio::test]
    async fn stale_verified_flag_is_corrected() {
        let harness = Harness::new();
        let uid = harness.identity.add_account("ada@example.com", "secret1", true);
        let mut record = sample_record(WALLET);
        record.email_verified = false;
        record.bonus_given = true;
        harness.seed_record(&uid, record).await;

        let done = logged_in(
            login(&harness.state(), &request("ada@example.com", "secret1"))
                .await
                .unwrap(),
        );

        assert_eq!(
            harness.store.updates(),
            vec![(
                uid.clone(),
                vec![UserUpdate::EmailVerified(true), UserUpdate::TouchLastLogin]
            )]
        );
        assert!(done.record.email_verified);
        assert!(harness.record(&uid).await.unwrap().email_verified);
    }

    #[tokio::test]
    async fn bonus_already_given_is_not_retried() {
        let harness = Harness::new();
        let uid = harness.identity.add_account("ada@example.com", "secret1", true);
        let mut record = sample_record(WALLET);
        record.bonus_given = true;
        harness.seed_record(&uid, record).await;

        let done = logged_in(
            login(&harness.state(), &request("ada@example.com", "secret1"))
                .await
                .unwrap(),
        );

        assert!(matches!(done.bonus, BonusStatus::AlreadyGiven));
        assert!(harness.bonus.calls().is_empty());
    }

    #[tokio::test]
    async fn login_does_not_wait_for_bonus() {
        let (bonus, gate) = FakeBonus::gated();
        let harness = Harness::with_bonus(bonus);
        let uid = harness.identity.add_account("ada@example.com", "secret1", true);
        harness.seed_record(&uid, sample_record(WALLET)).await;

        let done = logged_in(
            login(&harness.state(), &request("ada@example.com", "secret1"))
                .await
                .unwrap(),
        );
        let BonusStatus::Pending(handle) = done.bonus else {
            panic!("bonus should be pending");
        };
        assert!(!handle.is_finished());
        assert!(!harness.record(&uid).await.unwrap().bonus_given);

        gate.notify_one();
        assert_eq!(handle.outcome().await, BonusOutcome::Granted);
        assert!(harness.record(&uid).await.unwrap().bonus_given);
    }

    #[tokio::test]
    async fn failed_bonus_leaves_flag_for_next_login() {
        let harness = Harness::with_bonus(FakeBonus::failing(
            crate::bonus::BonusError::Unavailable("503".into()),
        ));
        let uid = harness.identity.add_account("ada@example.com", "secret1", true);
        harness.seed_record(&uid, sample_record(WALLET)).await;

        let done = logged_in(
            login(&harness.state(), &request("ada@example.com", "secret1"))
                .await
                .unwrap(),
        );
        let BonusStatus::Pending(handle) = done.bonus else {
            panic!("bonus should be pending");
        };
        assert!(matches!(handle.outcome().await, BonusOutcome::Failed(_)));
        assert!(!harness.record(&uid).await.unwrap().bonus_given);
    }

    #[tokio::test]
    async fn first_google_login_provisions_wallet() {
        let harness = Harness::new();
        let uid = harness
            .identity
            .add_google("google-token", "gina@example.com", "Gina");
        let credential = OAuthCredential::Google {
            id_token: "google-token".into(),
        };

        let done = login_with_google(&harness.state(), &credential)
            .await
            .unwrap();

        let wallet = done.provisioned.expect("wallet should be provisioned");
        assert_eq!(wallet.username, "Gina");
        let stored = harness.record(&uid).await.unwrap();
        assert_eq!(stored.wallet_address, wallet.wallet_address);
        assert_eq!(stored.auth_provider, AuthProvider::Google);
        assert!(stored.email_verified);
        assert!(stored.last_login.is_some());
        assert_eq!(stored.photo_url.as_deref(), Some("https://example.com/photo.png"));
        assert_eq!(done.stages.last(), Some(&LoginStage::LoggedIn));
        assert!(matches!(done.bonus, BonusStatus::Pending(_)));
    }

    #[tokio::test]
    async fn returning_google_user_keeps_wallet() {
        let harness = Harness::new();
        let uid = harness
            .identity
            .add_google("google-token", "gina@example.com", "Gina");
        harness.seed_record(&uid, sample_record(WALLET)).await;
        let credential = OAuthCredential::Google {
            id_token: "google-token".into(),
        };

        let done = login_with_google(&harness.state(), &credential)
            .await
            .unwrap();

        assert!(done.provisioned.is_none());
        assert_eq!(harness.wallets.calls(), 0);
        assert_eq!(done.record.wallet_address, WALLET);
    }

    #[tokio::test]
    async fn google_popup_cancel_is_classified() {
        let harness = Harness::new();
        harness
            .identity
            .fail(IdentityOp::OAuth, "auth/popup-closed-by-user");

        let err = login_with_google(
            &harness.state(),
            &OAuthCredential::Google {
                id_token: "x".into(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.user_message(),
            "Google login was cancelled. Please try again."
        );
    }

    #[tokio::test]
    async fn password_reset() {
        let harness = Harness::new();
        let state = harness.state();

        assert!(matches!(
            send_password_reset(&state, " ").await,
            Err(AppError::MissingEmail)
        ));

        send_password_reset(&state, "ada@example.com").await.unwrap();
        assert_eq!(
            harness.identity.reset_emails(),
            vec!["ada@example.com".to_string()]
        );

        harness
            .identity
            .fail(IdentityOp::SendReset, "auth/user-not-found");
        let err = send_password_reset(&state, "ghost@example.com")
            .await
            .unwrap_err();
        assert!(err.user_message().starts_with("No account found with this email"));
    }

    #[tokio::test]
    async fn resend_verification_paths() {
        let harness = Harness::new();
        harness.identity.add_account("new@example.com", "secret1", false);
        harness.identity.add_account("old@example.com", "secret1", true);
        let state = harness.state();

        assert!(matches!(
            resend_verification(&state, "new@example.com", "").await,
            Err(AppError::MissingCredentials)
        ));

        assert_eq!(
            resend_verification(&state, "old@example.com", "secret1")
                .await
                .unwrap(),
            ResendOutcome::AlreadyVerified
        );
        assert_eq!(
            resend_verification(&state, "new@example.com", "secret1")
                .await
                .unwrap(),
            ResendOutcome::Sent
        );

        assert_eq!(
            harness.identity.verification_emails(),
            vec!["new@example.com".to_string()]
        );
        assert_eq!(harness.identity.sign_outs(), 2);
    }
}
