use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::auth::storage::{CredentialStorage, FileStorage};
use crate::auth::store::CredentialStore;
use crate::error::{Error, Result};
use crate::identity::Identity;

/// Production API host.
pub const BASE_URL: &str = "https://api.weixin.qq.com";

/// Codes the platform uses for a stale, revoked or malformed access_token.
/// Only these trigger the transparent refresh-and-retry; the set is
/// extensible through [`ClientBuilder::auth_retry_code`] because the
/// platform's documented set is larger and may grow.
pub const CREDENTIAL_INVALID_CODES: [i64; 3] = [40001, 40014, 42001];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Uniform success/failure wrapper present in every response body.
/// `errcode == 0` or absent means success regardless of HTTP status.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Request body, kept in a rebuildable form so the single
/// refresh-and-retry can construct a fresh transport call. Multipart file
/// content is streamed from disk on each attempt, never buffered.
enum Payload<'a> {
    Empty,
    Json(&'a Value),
    Multipart {
        field: &'a str,
        file: &'a Path,
        extra: &'a [(&'a str, String)],
    },
}

/// WeChat Official Account API client.
///
/// Owns the HTTP transport and the credential store; every call made
/// through it carries a currently-valid access_token as a query parameter,
/// attached here and never by callers.
pub struct WechatClient {
    http: Client,
    base_url: String,
    credentials: CredentialStore,
    auth_retry_codes: HashSet<i64>,
}

impl WechatClient {
    /// Client with identity resolved from the environment (or `.env`) and a
    /// file cache in the working directory.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn with_identity(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Result<Self> {
        Self::builder()
            .app_id(app_id)
            .app_secret(app_secret)
            .build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Material operations bound to this client.
    pub fn materials(&self) -> crate::api::Materials<'_> {
        crate::api::Materials::new(self)
    }

    /// Draft and publication operations bound to this client.
    pub fn drafts(&self) -> crate::api::Drafts<'_> {
        crate::api::Drafts::new(self)
    }

    /// Datacube analytics queries bound to this client.
    pub fn stats(&self) -> crate::api::Stats<'_> {
        crate::api::Stats::new(self)
    }

    /// The currently-valid access_token, issuing one if needed. Exposed for
    /// callers that build requests outside this client; everything routed
    /// through it gets the token attached automatically.
    pub async fn access_token(&self) -> Result<String> {
        Ok(self.credentials.get_valid().await?.value)
    }

    /// Query-only GET returning a decoded payload.
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let value = self
            .dispatch(Method::GET, endpoint, query, Payload::Empty)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// JSON-body POST returning a decoded payload.
    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        // serde_json keeps non-ASCII text unescaped, which the draft
        // endpoints require for CJK content.
        let body = serde_json::to_value(body)?;
        let value = self
            .dispatch(Method::POST, endpoint, &[], Payload::Json(&body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Multipart upload of one binary field plus optional form fields.
    /// Field name and filename are preserved verbatim.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        field: &str,
        file: &Path,
        extra: &[(&str, String)],
    ) -> Result<T> {
        let value = self
            .dispatch(
                Method::POST,
                endpoint,
                &[],
                Payload::Multipart { field, file, extra },
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch raw bytes from a media endpoint. Error envelopes only appear
    /// with a JSON or text content type; any other content type is the
    /// requested binary.
    pub async fn download(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Bytes> {
        let cred = self.credentials.get_valid().await?;
        let url = format!("{}{}", self.base_url, endpoint);
        let request = match body {
            Some(json) => self.http.post(&url).json(json),
            None => self.http.get(&url),
        };
        let response = request
            .query(&[("access_token", cred.value.as_str())])
            .query(query)
            .send()
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let bytes = response.bytes().await?;

        if content_type.contains("application/json") || content_type.contains("text/plain") {
            if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(&bytes) {
                if envelope.errcode != 0 {
                    return Err(Error::Api {
                        code: envelope.errcode,
                        message: envelope.errmsg,
                    });
                }
            }
        }
        Ok(bytes)
    }

    /// Executes one logical operation with the bounded stale-token retry.
    ///
    /// At most two transport attempts are made. Only a credential-invalid
    /// code triggers the second one; every other non-zero code is
    /// surfaced immediately so genuine failures are never masked behind
    /// retry loops, and transport errors propagate on any attempt.
    async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        payload: Payload<'_>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        for attempt in 0..2u8 {
            let cred = self.credentials.get_valid().await?;

            let mut request = self
                .http
                .request(method.clone(), &url)
                .query(&[("access_token", cred.value.as_str())])
                .query(query);
            request = match &payload {
                Payload::Empty => request,
                Payload::Json(body) => request.json(body),
                Payload::Multipart { field, file, extra } => {
                    request.multipart(multipart_form(field, file, extra).await?)
                }
            };

            let body = request.send().await?.text().await?;
            let value: Value = serde_json::from_str(&body)?;

            let errcode = value.get("errcode").and_then(Value::as_i64).unwrap_or(0);
            if errcode == 0 {
                debug!(endpoint, "request ok");
                return Ok(value);
            }
            let errmsg = value
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();

            if self.auth_retry_codes.contains(&errcode) {
                self.credentials.invalidate().await;
                if attempt == 0 {
                    warn!(endpoint, errcode, "access_token rejected, refreshing once");
                    continue;
                }
                return Err(Error::Auth {
                    code: errcode,
                    message: errmsg,
                });
            }

            return Err(Error::Api {
                code: errcode,
                message: errmsg,
            });
        }
        unreachable!("dispatch loop returns on the second attempt")
    }
}

/// Builds the multipart body for an upload, streaming the file from disk.
async fn multipart_form(field: &str, file: &Path, extra: &[(&str, String)]) -> Result<Form> {
    let file_name = file
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("upload")
        .to_owned();
    let handle = tokio::fs::File::open(file).await?;
    let length = handle.metadata().await?.len();
    let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(handle)), length)
        .file_name(file_name);

    let mut form = Form::new().part(field.to_owned(), part);
    for (key, value) in extra {
        form = form.text((*key).to_owned(), value.clone());
    }
    Ok(form)
}

/// Configures and constructs a [`WechatClient`].
pub struct ClientBuilder {
    app_id: Option<String>,
    app_secret: Option<String>,
    env_file: Option<PathBuf>,
    base_url: String,
    cache_dir: PathBuf,
    storage: Option<Box<dyn CredentialStorage>>,
    timeout: Duration,
    auth_retry_codes: HashSet<i64>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            env_file: None,
            base_url: BASE_URL.to_owned(),
            cache_dir: PathBuf::from("."),
            storage: None,
            timeout: DEFAULT_TIMEOUT,
            auth_retry_codes: CREDENTIAL_INVALID_CODES.into_iter().collect(),
        }
    }
}

impl ClientBuilder {
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(app_secret.into());
        self
    }

    /// Explicit `.env` file instead of working-directory discovery.
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Override the API host (tests point this at a mock server).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Directory for the token cache file. Ignored when a custom storage
    /// backend is installed.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Custom credential cache backend.
    pub fn storage(mut self, storage: Box<dyn CredentialStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Treat an additional platform code as "credential invalid".
    pub fn auth_retry_code(mut self, code: i64) -> Self {
        self.auth_retry_codes.insert(code);
        self
    }

    pub fn build(self) -> Result<WechatClient> {
        let identity = Identity::resolve(self.app_id, self.app_secret, self.env_file.as_deref())?;
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(Error::Transport)?;
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(FileStorage::new(&self.cache_dir)));
        let credentials = CredentialStore::new(identity, http.clone(), &self.base_url, storage);

        Ok(WechatClient {
            http,
            base_url: self.base_url,
            credentials,
            auth_retry_codes: self.auth_retry_codes,
        })
    }
}
