// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firestore-backed [`UserStore`] over the REST API.
//!
//! Documents live at `users/{uid}`. Field values use Firestore's typed JSON
//! encoding (`{"stringValue": ..}`, `{"integerValue": "12"}`, ...).
//!
//! - `create` posts with `documentId`, which fails with 409 on an existing id
//! - `update` and `increment_earnings` go through `:commit` so timestamp
//!   sentinels become `REQUEST_TIME` transforms and counters become server-side
//!   `increment` transforms (atomic across clients)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

use super::IdTokenCell;
use crate::models::{UserRecord, UserUpdate};
use crate::storage::{StorageError, StorageResult, UserStore, USERS_COLLECTION};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Record fields stored as Firestore timestamps rather than strings.
const TIMESTAMP_FIELDS: [&str; 3] = ["createdAt", "lastCheckIn", "lastLogin"];

#[derive(Debug, Clone)]
pub struct FirestoreUserStore {
    project_id: String,
    api_key: String,
    base_url: String,
    http: Client,
    token: IdTokenCell,
}

impl FirestoreUserStore {
    pub fn new(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        http: Client,
        token: IdTokenCell,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            http,
            token,
        }
    }

    /// Point at a different endpoint (e.g. the Firestore emulator).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `projects/{p}/databases/(default)/documents`
    fn database_path(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    fn document_name(&self, uid: &str) -> String {
        format!("{}/{}/{}", self.database_path(), USERS_COLLECTION, uid)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("key", self.api_key.as_str())]);
        match self.token.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn commit(&self, uid: &str, write: Value) -> StorageResult<()> {
        let url = self.url(&format!("{}:commit", self.database_path()));
        let response = self
            .authorize(self.http.post(url))
            .json(&json!({ "writes": [write] }))
            .send()
            .await
            .map_err(|e| StorageError::Remote(format!("commit failed: {e}")))?;

        check_status(response, uid).await.map(|_| ())
    }
}

#[async_trait]
impl UserStore for FirestoreUserStore {
    async fn get(&self, uid: &str) -> StorageResult<Option<UserRecord>> {
        let response = self
            .authorize(self.http.get(self.url(&self.document_name(uid))))
            .send()
            .await
            .map_err(|e| StorageError::Remote(format!("GET users/{uid} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = check_status(response, uid).await?;
        let fields = document.get("fields").cloned().unwrap_or_else(|| json!({}));
        Ok(Some(decode_record(&fields)?))
    }

    async fn create(&self, uid: &str, record: &UserRecord) -> StorageResult<()> {
        let url = self.url(&format!("{}/{}", self.database_path(), USERS_COLLECTION));
        let response = self
            .authorize(self.http.post(url))
            .query(&[("documentId", uid)])
            .json(&json!({ "fields": encode_record(record)? }))
            .send()
            .await
            .map_err(|e| StorageError::Remote(format!("create users/{uid} failed: {e}")))?;

        check_status(response, uid).await?;
        debug!(uid = %uid, "User document created");
        Ok(())
    }

    async fn update(&self, uid: &str, updates: &[UserUpdate]) -> StorageResult<()> {
        self.commit(uid, update_write(&self.document_name(uid), updates))
            .await
    }

    async fn increment_earnings(&self, uid: &str, game: &str, delta: u64) -> StorageResult<()> {
        let write = json!({
            "transform": {
                "document": self.document_name(uid),
                "fieldTransforms": [{
                    "fieldPath": format!("gamesEarnings.{}", field_path_segment(game)),
                    "increment": { "integerValue": delta.to_string() }
                }]
            },
            "currentDocument": { "exists": true }
        });
        self.commit(uid, write).await
    }
}

async fn check_status(response: reqwest::Response, uid: &str) -> StorageResult<Value> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| StorageError::Remote(format!("invalid response: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Err(StorageError::NotFound(format!("users/{uid}"))),
        StatusCode::CONFLICT => Err(StorageError::AlreadyExists(format!("users/{uid}"))),
        _ => Err(StorageError::Remote(format!("{status}: {body}"))),
    }
}

/// Build a `:commit` write merging `updates` into an existing document.
fn update_write(document: &str, updates: &[UserUpdate]) -> Value {
    let mut fields = Map::new();
    let mut mask = Vec::new();
    let mut transforms = Vec::new();

    for update in updates {
        match update {
            UserUpdate::BonusGiven(value) => {
                fields.insert("bonusGiven".into(), json!({ "booleanValue": value }));
                mask.push("bonusGiven");
            }
            UserUpdate::EmailVerified(value) => {
                fields.insert("emailVerified".into(), json!({ "booleanValue": value }));
                mask.push("emailVerified");
            }
            UserUpdate::TouchLastLogin => transforms.push(json!({
                "fieldPath": "lastLogin",
                "setToServerValue": "REQUEST_TIME"
            })),
            UserUpdate::TouchLastCheckIn => transforms.push(json!({
                "fieldPath": "lastCheckIn",
                "setToServerValue": "REQUEST_TIME"
            })),
        }
    }

    json!({
        "update": { "name": document, "fields": fields },
        "updateMask": { "fieldPaths": mask },
        "updateTransforms": transforms,
        "currentDocument": { "exists": true }
    })
}

/// Quote a map key for use in a field path when it is not a plain identifier.
fn field_path_segment(key: &str) -> String {
    let mut chars = key.chars();
    let simple = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_record(record: &UserRecord) -> StorageResult<Value> {
    let plain = serde_json::to_value(record)?;
    let Value::Object(map) = plain else {
        return Err(StorageError::Remote("record did not serialize to a map".into()));
    };

    let mut fields = Map::new();
    for (key, value) in map {
        let encoded = match (&value, TIMESTAMP_FIELDS.contains(&key.as_str())) {
            (Value::String(ts), true) => json!({ "timestampValue": ts }),
            _ => encode_value(&value),
        };
        fields.insert(key, encoded);
    }
    Ok(Value::Object(fields))
}

/// Plain JSON to Firestore typed value.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_f64() => json!({ "doubleValue": n }),
        Value::Number(n) => json!({ "integerValue": n.to_string() }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

fn decode_record(fields: &Value) -> StorageResult<UserRecord> {
    let plain = decode_fields(fields);
    Ok(serde_json::from_value(plain)?)
}

fn decode_fields(fields: &Value) -> Value {
    let map = fields
        .as_object()
        .map(|m| {
            m.iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect::<Map<String, Value>>()
        })
        .unwrap_or_default();
    Value::Object(map)
}

/// Firestore typed value to plain JSON.
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or(Value::Null),
        // Integral doubles come from clients that write plain JS numbers
        "doubleValue" => match inner.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => {
                Value::from(f as u64)
            }
            Some(f) => Value::from(f),
            None => Value::Null,
        },
        "mapValue" => decode_fields(inner.get("fields").unwrap_or(&Value::Null)),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "nullValue" => Value::Null,
        _ => inner.clone(),
    }
}
