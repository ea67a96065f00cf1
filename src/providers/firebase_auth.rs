// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase Authentication over the Identity Toolkit REST API.
//!
//! REST failures come back as `{"error": {"message": "EMAIL_EXISTS"}}`; they
//! are translated to the `auth/...` codes the rest of the crate classifies.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::IdTokenCell;
use crate::auth::{
    IdentityProvider, IdentityUser, OAuthCredential, ProfileUpdate, ProviderError, Session,
};

const IDENTITY_TOOLKIT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
/// Redirect URI sent with IdP sign-in; only checked for well-formedness when
/// the credential is an ID token.
const OAUTH_REQUEST_URI: &str = "http://localhost";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity Toolkit client bound to one Firebase project's web API key.
#[derive(Debug, Clone)]
pub struct FirebaseAuthClient {
    api_key: String,
    base_url: String,
    http: Client,
    token: IdTokenCell,
}

impl FirebaseAuthClient {
    /// `token` receives the ID token of every new session and is cleared on
    /// sign-out.
    pub fn new(api_key: impl Into<String>, http: Client, token: IdTokenCell) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: IDENTITY_TOOLKIT_BASE_URL.to_string(),
            http,
            token,
        }
    }

    /// Point at a different endpoint (e.g. the Auth emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
    ) -> Result<T, ProviderError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.base_url.trim_end_matches('/'),
            method,
            self.api_key
        );
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{method} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(method, %status, "Identity Toolkit request rejected");
            return Err(map_error_body(&body));
        }

        response.json().await.map_err(|e| {
            ProviderError::new("auth/internal-error", format!("invalid {method} response: {e}"))
        })
    }

    async fn lookup(&self, id_token: &str) -> Result<IdentityUser, ProviderError> {
        let response: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        let account = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new("auth/user-not-found", "no account for token"))?;

        Ok(IdentityUser {
            uid: account.local_id,
            email: account.email.unwrap_or_default(),
            email_verified: account.email_verified,
            display_name: account.display_name,
            photo_url: account.photo_url,
        })
    }

    async fn session_from(&self, tokens: TokenResponse) -> Result<Session, ProviderError> {
        let user = self.lookup(&tokens.id_token).await?;
        self.token.set(tokens.id_token.clone());
        Ok(Session {
            user,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn create_account(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let tokens: TokenResponse = self
            .call(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.session_from(tokens).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ProviderError> {
        let tokens: TokenResponse = self
            .call(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.session_from(tokens).await
    }

    async fn sign_in_with_oauth(
        &self,
        credential: &OAuthCredential,
    ) -> Result<Session, ProviderError> {
        let tokens: TokenResponse = self
            .call(
                "signInWithIdp",
                &json!({
                    "postBody": idp_post_body(credential),
                    "requestUri": OAUTH_REQUEST_URI,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        self.session_from(tokens).await
    }

    async fn send_verification_email(&self, session: &Session) -> Result<(), ProviderError> {
        let _: Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": session.id_token }),
            )
            .await?;
        Ok(())
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), ProviderError> {
        let _: Value = self
            .call(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }

    async fn reload(&self, session: &Session) -> Result<IdentityUser, ProviderError> {
        self.lookup(&session.id_token).await
    }

    async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<(), ProviderError> {
        let mut payload = json!({ "idToken": session.id_token, "returnSecureToken": false });
        if let Some(name) = &update.display_name {
            payload["displayName"] = Value::String(name.clone());
        }
        if let Some(photo) = &update.photo_url {
            payload["photoUrl"] = Value::String(photo.clone());
        }
        let _: Value = self.call("update", &payload).await?;
        Ok(())
    }

    async fn sign_out(&self, session: Session) -> Result<(), ProviderError> {
        // ID tokens are stateless; dropping them ends the session client-side.
        self.token.clear();
        debug!(uid = %session.uid(), "Session ended");
        Ok(())
    }
}

fn idp_post_body(credential: &OAuthCredential) -> String {
    match credential {
        OAuthCredential::Google { id_token } => {
            url::form_urlencoded::Serializer::new(String::new())
                .append_pair("id_token", id_token)
                .append_pair("providerId", credential.provider_id())
                .finish()
        }
    }
}

fn map_error_body(body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => map_rest_message(&envelope.error.message),
        Err(_) => ProviderError::new("auth/internal-error", body.to_string()),
    }
}

/// Translate an Identity Toolkit error message (`CODE` or `CODE : detail`).
fn map_rest_message(message: &str) -> ProviderError {
    let (rest_code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), message.trim()),
    };

    let code = match rest_code {
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "INVALID_EMAIL" | "MISSING_EMAIL" => "auth/invalid-email",
        "WEAK_PASSWORD" => "auth/weak-password",
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => "auth/operation-not-allowed",
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "INVALID_IDP_RESPONSE" => {
            "auth/invalid-credential"
        }
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => "auth/user-not-found",
        "USER_DISABLED" => "auth/user-disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" => "auth/user-token-expired",
        _ => "auth/internal-error",
    };
    ProviderError::new(code, detail)
}
