use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::WechatClient;
use crate::error::Result;

/// Permanent/temporary material kinds the platform accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Voice,
    Video,
    Thumb,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Voice => "voice",
            MediaType::Video => "video",
            MediaType::Thumb => "thumb",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MaterialCount {
    pub voice_count: i64,
    pub video_count: i64,
    pub image_count: i64,
    pub news_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct MaterialList {
    pub total_count: i64,
    pub item_count: i64,
    #[serde(default)]
    pub item: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct TemporaryMedia {
    pub media_id: String,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MediaIdResponse {
    media_id: String,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: String,
}

/// Permanent and temporary material operations.
pub struct Materials<'a> {
    client: &'a WechatClient,
}

impl<'a> Materials<'a> {
    pub(crate) fn new(client: &'a WechatClient) -> Self {
        Self { client }
    }

    /// Upload a permanent material, returning its media_id.
    pub async fn upload_permanent(&self, media_type: MediaType, file: &Path) -> Result<String> {
        let extra = [("type", media_type.as_str().to_owned())];
        let resp: MediaIdResponse = self
            .client
            .upload("/cgi-bin/material/add_material", "media", file, &extra)
            .await?;
        Ok(resp.media_id)
    }

    /// Upload a permanent video, which additionally wants a title and
    /// introduction in a JSON-encoded `description` form field.
    pub async fn upload_video(
        &self,
        file: &Path,
        title: &str,
        introduction: &str,
    ) -> Result<String> {
        let description = json!({ "title": title, "introduction": introduction });
        let extra = [
            ("type", MediaType::Video.as_str().to_owned()),
            ("description", description.to_string()),
        ];
        let resp: MediaIdResponse = self
            .client
            .upload("/cgi-bin/material/add_material", "media", file, &extra)
            .await?;
        Ok(resp.media_id)
    }

    /// Upload an image for use inside article bodies. Returns a URL, not a
    /// media_id; these do not count against the material quota.
    pub async fn upload_article_image(&self, file: &Path) -> Result<String> {
        let resp: UrlResponse = self
            .client
            .upload("/cgi-bin/media/uploadimg", "media", file, &[])
            .await?;
        Ok(resp.url)
    }

    /// Fetch permanent material details. News material comes back as JSON;
    /// for binary kinds use [`Materials::download`] instead.
    pub async fn get(&self, media_id: &str) -> Result<Value> {
        self.client
            .post("/cgi-bin/material/get_material", &json!({ "media_id": media_id }))
            .await
    }

    /// Download a binary permanent material.
    pub async fn download(&self, media_id: &str) -> Result<Bytes> {
        self.client
            .download(
                "/cgi-bin/material/get_material",
                &[],
                Some(&json!({ "media_id": media_id })),
            )
            .await
    }

    pub async fn delete(&self, media_id: &str) -> Result<()> {
        let _: Value = self
            .client
            .post("/cgi-bin/material/del_material", &json!({ "media_id": media_id }))
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<MaterialCount> {
        self.client.get("/cgi-bin/material/get_materialcount", &[]).await
    }

    /// Page through permanent materials. `count` is clamped to the
    /// platform's 1..=20 window.
    pub async fn list(
        &self,
        media_type: MediaType,
        offset: u32,
        count: u32,
    ) -> Result<MaterialList> {
        let count = count.clamp(1, 20);
        self.client
            .post(
                "/cgi-bin/material/batchget_material",
                &json!({
                    "type": media_type.as_str(),
                    "offset": offset,
                    "count": count,
                }),
            )
            .await
    }

    /// Upload a temporary material (valid for three days platform-side).
    pub async fn upload_temporary(
        &self,
        media_type: MediaType,
        file: &Path,
    ) -> Result<TemporaryMedia> {
        let extra = [("type", media_type.as_str().to_owned())];
        self.client
            .upload("/cgi-bin/media/upload", "media", file, &extra)
            .await
    }

    /// Download a temporary material.
    pub async fn download_temporary(&self, media_id: &str) -> Result<Bytes> {
        self.client
            .download("/cgi-bin/media/get", &[("media_id", media_id.to_owned())], None)
            .await
    }

    /// Download the high-definition rendition of a voice material uploaded
    /// through the JSSDK.
    pub async fn download_hd_voice(&self, media_id: &str) -> Result<Bytes> {
        self.client
            .download(
                "/cgi-bin/media/get/jssdk",
                &[("media_id", media_id.to_owned())],
                None,
            )
            .await
    }
}
