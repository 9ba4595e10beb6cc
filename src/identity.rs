use std::env;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable holding the Official Account AppID.
pub const APPID_ENV: &str = "WECHAT_APPID";
/// Environment variable holding the Official Account AppSecret.
pub const APPSECRET_ENV: &str = "WECHAT_APPSECRET";

/// Long-lived application identity, used only to exchange for an
/// access_token. Resolved once at client construction, immutable afterward.
#[derive(Debug, Clone)]
pub struct Identity {
    pub app_id: String,
    pub app_secret: String,
}

impl Identity {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Resolve the identity in priority order: explicit parameters, process
    /// environment, then a `.env` file (a specific path, or discovered from
    /// the working directory upward).
    ///
    /// `dotenvy` never overrides variables already present in the
    /// environment, which is exactly the precedence we need.
    pub fn resolve(
        app_id: Option<String>,
        app_secret: Option<String>,
        env_file: Option<&Path>,
    ) -> Result<Self> {
        if app_id.is_none() || app_secret.is_none() {
            match env_file {
                Some(path) => {
                    let _ = dotenvy::from_path(path);
                }
                None => {
                    let _ = dotenvy::dotenv();
                }
            }
        }

        let app_id = app_id
            .or_else(|| env::var(APPID_ENV).ok())
            .filter(|v| !v.is_empty());
        let app_secret = app_secret
            .or_else(|| env::var(APPSECRET_ENV).ok())
            .filter(|v| !v.is_empty());

        match (app_id, app_secret) {
            (Some(app_id), Some(app_secret)) => {
                debug!(app_id = %app_id, "resolved wechat identity");
                Ok(Self { app_id, app_secret })
            }
            _ => Err(Error::Config(format!(
                "set {APPID_ENV} and {APPSECRET_ENV}, create a .env file, \
                 or pass appid/appsecret explicitly"
            ))),
        }
    }
}
