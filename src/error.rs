use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for every client operation.
///
/// `Api` keeps the platform's original numeric code and message so callers
/// can branch on them. `Auth` covers both "token could not be issued" and
/// "token stayed invalid after one refresh"; issuance failures caused by the
/// transport carry the sentinel code `-1`.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-level failure: connection refused, DNS, timeout. Never
    /// retried by this layer.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The access_token could not be obtained, or remained invalid after
    /// one transparent refresh.
    #[error("authentication failed [{code}]: {message}")]
    Auth { code: i64, message: String },

    /// The platform rejected the request for a reason unrelated to
    /// credential staleness (bad parameters, quota, permission).
    #[error("wechat api error [{code}]: {message}")]
    Api { code: i64, message: String },

    /// Identity could not be resolved from parameters, environment or .env.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-side argument rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Response body was not the JSON shape the endpoint advertises.
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local file access failed (upload source, download target).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Platform error code, if this failure carries one.
    pub fn errcode(&self) -> Option<i64> {
        match self {
            Error::Auth { code, .. } | Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
