//! # WeChat Official Account publishing client
//!
//! Authenticates against the Official Account platform, caches the
//! short-lived `access_token` across calls and process restarts, and
//! exposes typed operations for material upload, draft management,
//! publication and datacube analytics.
//!
//! Modules:
//! - `auth` — credential cache: validity checks, issuance, persistence
//! - `client` — request dispatch: envelope decoding, bounded stale-token retry
//! - `api` — material, draft and analytics endpoint surfaces
//! - `identity` — appid/appsecret resolution (params, env, .env)
//!
//! ```no_run
//! use wxpub::WechatClient;
//!
//! #[tokio::main]
//! async fn main() -> wxpub::Result<()> {
//!     let client = WechatClient::new()?; // WECHAT_APPID / WECHAT_APPSECRET
//!     let count = client.drafts().count().await?;
//!     println!("drafts: {count}");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod helpers;
pub mod identity;
pub mod tests;

pub use crate::api::{Article, Drafts, Materials, MediaType, Stats};
pub use crate::auth::{Credential, CredentialStorage, FileStorage, MemoryStorage};
pub use crate::client::{ClientBuilder, WechatClient, BASE_URL, CREDENTIAL_INVALID_CODES};
pub use crate::error::{Error, Result};
pub use crate::identity::Identity;
