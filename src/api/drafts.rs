use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::WechatClient;
use crate::error::Result;

/// One article inside a draft. Content is passed through verbatim; the
/// platform enforces its own shape rules and reports them via errcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub thumb_media_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_open_comment: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_fans_can_comment: Option<u8>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        thumb_media_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            thumb_media_id: thumb_media_id.into(),
            author: None,
            digest: None,
            content_source_url: None,
            need_open_comment: None,
            only_fans_can_comment: None,
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct DraftList {
    pub total_count: i64,
    pub item_count: i64,
    #[serde(default)]
    pub item: Vec<Value>,
}

/// Publish task state as reported by the freepublish endpoints.
/// `publish_status`: 0 done, 1 publishing, 2 original-check failed,
/// 3 failed, 4 rejected by platform audit, 5 deleted by user afterwards.
#[derive(Debug, Deserialize)]
pub struct PublishStatus {
    pub publish_id: Value,
    pub publish_status: i64,
    pub article_id: Option<String>,
    #[serde(default)]
    pub fail_idx: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct MediaIdResponse {
    media_id: String,
}

#[derive(Debug, Deserialize)]
struct PublishIdResponse {
    publish_id: Value,
}

#[derive(Debug, Deserialize)]
struct TotalCountResponse {
    total_count: i64,
}

/// Draft box and publication operations.
pub struct Drafts<'a> {
    client: &'a WechatClient,
}

impl<'a> Drafts<'a> {
    pub(crate) fn new(client: &'a WechatClient) -> Self {
        Self { client }
    }

    /// Create a draft from one or more articles, returning its media_id.
    pub async fn add(&self, articles: &[Article]) -> Result<String> {
        let resp: MediaIdResponse = self
            .client
            .post("/cgi-bin/draft/add", &json!({ "articles": articles }))
            .await?;
        Ok(resp.media_id)
    }

    /// Full draft details, including the `news_item` article list.
    pub async fn get(&self, media_id: &str) -> Result<Value> {
        self.client
            .post("/cgi-bin/draft/get", &json!({ "media_id": media_id }))
            .await
    }

    /// Replace the article at `index` inside an existing draft.
    pub async fn update(&self, media_id: &str, index: u32, article: &Article) -> Result<()> {
        let _: Value = self
            .client
            .post(
                "/cgi-bin/draft/update",
                &json!({
                    "media_id": media_id,
                    "index": index,
                    "articles": article,
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, media_id: &str) -> Result<()> {
        let _: Value = self
            .client
            .post("/cgi-bin/draft/delete", &json!({ "media_id": media_id }))
            .await?;
        Ok(())
    }

    /// Page through drafts. `count` is clamped to 1..=20.
    pub async fn list(&self, offset: u32, count: u32, no_content: bool) -> Result<DraftList> {
        let count = count.clamp(1, 20);
        self.client
            .post(
                "/cgi-bin/draft/batchget",
                &json!({
                    "offset": offset,
                    "count": count,
                    "no_content": if no_content { 1 } else { 0 },
                }),
            )
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        let resp: TotalCountResponse = self.client.get("/cgi-bin/draft/count", &[]).await?;
        Ok(resp.total_count)
    }

    /// Turn on the account's draft box feature. The platform treats this as
    /// a one-way switch.
    pub async fn open_switch(&self) -> Result<()> {
        let _: Value = self
            .client
            .post("/cgi-bin/draft/switch", &json!({ "checkonly": 0 }))
            .await?;
        Ok(())
    }

    /// Whether the draft box feature is enabled. The platform reports
    /// `is_open` as 0/1 in some responses and as a bool in others.
    pub async fn switch_status(&self) -> Result<bool> {
        let resp: Value = self
            .client
            .post("/cgi-bin/draft/switch", &json!({ "checkonly": 1 }))
            .await?;
        let is_open = resp
            .get("is_open")
            .map(|v| v.as_bool().unwrap_or_else(|| v.as_i64().unwrap_or(0) != 0))
            .unwrap_or(false);
        Ok(is_open)
    }

    /// Submit a draft for publication; returns the publish task id to poll
    /// with [`Drafts::publish_status`].
    pub async fn publish(&self, media_id: &str) -> Result<String> {
        let resp: PublishIdResponse = self
            .client
            .post("/cgi-bin/freepublish/submit", &json!({ "media_id": media_id }))
            .await?;
        // the platform returns this id as a number on submit but expects a
        // string on status queries
        Ok(match resp.publish_id {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub async fn publish_status(&self, publish_id: &str) -> Result<PublishStatus> {
        self.client
            .post("/cgi-bin/freepublish/get", &json!({ "publish_id": publish_id }))
            .await
    }

    pub async fn get_published(&self, article_id: &str) -> Result<Value> {
        self.client
            .post(
                "/cgi-bin/freepublish/getarticle",
                &json!({ "article_id": article_id }),
            )
            .await
    }

    pub async fn list_published(
        &self,
        offset: u32,
        count: u32,
        no_content: bool,
    ) -> Result<DraftList> {
        let count = count.clamp(1, 20);
        self.client
            .post(
                "/cgi-bin/freepublish/batchget",
                &json!({
                    "offset": offset,
                    "count": count,
                    "no_content": if no_content { 1 } else { 0 },
                }),
            )
            .await
    }

    /// Remove a published article (or one item of a multi-article post).
    pub async fn delete_published(&self, article_id: &str, index: u32) -> Result<()> {
        let _: Value = self
            .client
            .post(
                "/cgi-bin/freepublish/delete",
                &json!({ "article_id": article_id, "index": index }),
            )
            .await?;
        Ok(())
    }
}
