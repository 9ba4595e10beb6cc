use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::credential::{Credential, DEFAULT_EXPIRES_IN_SECS};
use crate::auth::storage::{CacheRecord, CredentialStorage};
use crate::error::{Error, Result};
use crate::helpers::time::now_i64;
use crate::identity::Identity;

/// Fixed grant type literal for the token exchange endpoint.
const GRANT_TYPE: &str = "client_credential";

/// Sentinel error code for issuance failures the platform never answered.
const TRANSPORT_CODE: i64 = -1;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Owns the cached access_token: checks validity, issues a replacement when
/// needed, and persists it across process restarts.
///
/// The whole read-expiry / issue / persist sequence runs under one lock so
/// concurrent callers always agree on a single credential and never race
/// into duplicate issuance calls. The lock is held only for that sequence,
/// never across a business request.
pub struct CredentialStore {
    identity: Identity,
    http: Client,
    token_url: String,
    storage: Box<dyn CredentialStorage>,
    current: Mutex<Option<Credential>>,
}

impl CredentialStore {
    pub fn new(
        identity: Identity,
        http: Client,
        base_url: &str,
        storage: Box<dyn CredentialStorage>,
    ) -> Self {
        Self {
            identity,
            http,
            token_url: format!("{base_url}/cgi-bin/token"),
            storage,
            current: Mutex::new(None),
        }
    }

    /// Returns a currently-valid credential, issuing a new one only when the
    /// cached one is missing or inside the safety margin.
    pub async fn get_valid(&self) -> Result<Credential> {
        let mut current = self.current.lock().await;

        if let Some(cred) = current.as_ref().filter(|c| c.is_valid()) {
            return Ok(cred.clone());
        }

        // Cold start: a previous process may have persisted a still-valid
        // token. Once this slot is populated (even with a tombstone from
        // invalidate()) the disk record is not consulted again, so a
        // known-bad token cannot be resurrected.
        if current.is_none() {
            if let Some(cred) = self.load_persisted().await {
                debug!("reusing persisted access_token");
                *current = Some(cred.clone());
                return Ok(cred);
            }
        }

        let cred = self.issue().await?;
        self.storage
            .save(&CacheRecord {
                appid: self.identity.app_id.clone(),
                access_token: cred.value.clone(),
                expires_at: cred.expires_at,
            })
            .await;
        *current = Some(cred.clone());
        Ok(cred)
    }

    /// Marks the cached credential as expired immediately, forcing the next
    /// `get_valid` to re-issue. Called after the platform rejects a token.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        match current.as_mut() {
            Some(cred) => cred.expires_at = 0,
            None => *current = Some(Credential::new(String::new(), 0)),
        }
        info!("access_token invalidated");
    }

    async fn load_persisted(&self) -> Option<Credential> {
        let record = self.storage.load().await?;
        if record.appid != self.identity.app_id {
            debug!("token cache belongs to another appid, ignoring");
            return None;
        }
        let cred = Credential::new(record.access_token, record.expires_at);
        cred.is_valid().then_some(cred)
    }

    /// One credential-exchange call. Not retried here: the retry policy for
    /// stale tokens lives in the dispatcher, and retrying issuance from
    /// inside it would open a recursive loop.
    async fn issue(&self) -> Result<Credential> {
        debug!("requesting new access_token");
        let response = self
            .http
            .get(&self.token_url)
            .query(&[
                ("grant_type", GRANT_TYPE),
                ("appid", &self.identity.app_id),
                ("secret", &self.identity.app_secret),
            ])
            .send()
            .await
            .map_err(|err| Error::Auth {
                code: TRANSPORT_CODE,
                message: format!("token endpoint unreachable: {err}"),
            })?;

        let body: TokenResponse = response.json().await.map_err(|err| Error::Auth {
            code: TRANSPORT_CODE,
            message: format!("token endpoint returned malformed body: {err}"),
        })?;

        if body.errcode != 0 {
            warn!(errcode = body.errcode, "token issuance rejected: {}", body.errmsg);
            return Err(Error::Auth {
                code: body.errcode,
                message: body.errmsg,
            });
        }

        let value = body.access_token.ok_or_else(|| Error::Auth {
            code: TRANSPORT_CODE,
            message: "token endpoint returned no access_token".into(),
        })?;
        let expires_in = body.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        info!(expires_in, "issued new access_token");
        Ok(Credential::new(value, now_i64() + expires_in))
    }
}
