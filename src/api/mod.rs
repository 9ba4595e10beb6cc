//! Thin parameter-to-endpoint surfaces over the dispatch layer. No
//! independent failure handling lives here; everything rides on
//! `WechatClient`'s envelope decoding and retry contract.

pub mod drafts;
pub mod materials;
pub mod stats;

pub use drafts::{Article, DraftList, Drafts, PublishStatus};
pub use materials::{MaterialCount, MaterialList, Materials, MediaType, TemporaryMedia};
pub use stats::Stats;
