// Endpoint-mapping checks for the manager surfaces: each operation must
// hit the right path with the right body shape and decode the documented
// response, all through the shared dispatch layer.

#[cfg(test)]
mod test {
    use std::io::Write;

    use chrono::NaiveDate;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;

    use crate::api::drafts::Article;
    use crate::api::materials::MediaType;
    use crate::auth::storage::MemoryStorage;
    use crate::client::WechatClient;
    use crate::error::Error;
    use crate::tests::common::{TEST_APPID, TEST_SECRET};

    fn client_for(server: &MockServer) -> WechatClient {
        WechatClient::builder()
            .app_id(TEST_APPID)
            .app_secret(TEST_SECRET)
            .base_url(server.base_url())
            .storage(Box::new(MemoryStorage::new()))
            .build()
            .unwrap()
    }

    fn mock_token(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/cgi-bin/token");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "access_token": "T1", "expires_in": 7200 }));
        });
    }

    #[tokio::test]
    async fn draft_add_posts_articles_and_returns_media_id() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let add = server.mock(|when, then| {
            when.method(POST)
                .path("/cgi-bin/draft/add")
                .query_param("access_token", "T1")
                .json_body(json!({
                    "articles": [{
                        "title": "你好，世界",
                        "content": "<p>正文</p>",
                        "thumb_media_id": "THUMB1",
                        "author": "au",
                    }]
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "media_id": "DRAFT1" }));
        });

        let client = client_for(&server);
        let article = Article::new("你好，世界", "<p>正文</p>", "THUMB1").author("au");
        let media_id = client.drafts().add(&[article]).await.unwrap();

        assert_eq!(media_id, "DRAFT1");
        add.assert_async().await;
    }

    #[tokio::test]
    async fn draft_publish_and_status_round() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        server.mock(|when, then| {
            when.method(POST)
                .path("/cgi-bin/freepublish/submit")
                .json_body(json!({ "media_id": "DRAFT1" }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "errcode": 0, "errmsg": "ok", "publish_id": 2247 }));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/cgi-bin/freepublish/get")
                .json_body(json!({ "publish_id": "2247" }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "publish_id": 2247,
                    "publish_status": 0,
                    "article_id": "ART1",
                }));
        });

        let client = client_for(&server);
        let publish_id = client.drafts().publish("DRAFT1").await.unwrap();
        assert_eq!(publish_id, "2247");

        let status = client.drafts().publish_status(&publish_id).await.unwrap();
        assert_eq!(status.publish_status, 0);
        assert_eq!(status.article_id.as_deref(), Some("ART1"));
    }

    #[tokio::test]
    async fn draft_switch_status_decodes_numeric_is_open() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let query = server.mock(|when, then| {
            when.method(POST)
                .path("/cgi-bin/draft/switch")
                .json_body(json!({ "checkonly": 1 }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "errcode": 0, "errmsg": "ok", "is_open": 1 }));
        });

        let client = client_for(&server);
        assert!(client.drafts().switch_status().await.unwrap());
        query.assert_async().await;
    }

    #[tokio::test]
    async fn draft_switch_open_posts_checkonly_zero() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let open = server.mock(|when, then| {
            when.method(POST)
                .path("/cgi-bin/draft/switch")
                .json_body(json!({ "checkonly": 0 }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "errcode": 0, "errmsg": "ok" }));
        });

        let client = client_for(&server);
        client.drafts().open_switch().await.unwrap();
        open.assert_async().await;
    }

    #[tokio::test]
    async fn material_count_decodes() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path("/cgi-bin/material/get_materialcount")
                .query_param("access_token", "T1");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "voice_count": 1, "video_count": 2,
                    "image_count": 3, "news_count": 4,
                }));
        });

        let client = client_for(&server);
        let count = client.materials().count().await.unwrap();
        assert_eq!(count.image_count, 3);
        assert_eq!(count.news_count, 4);
    }

    #[tokio::test]
    async fn permanent_upload_returns_media_id() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let upload = server.mock(|when, then| {
            when.method(POST)
                .path("/cgi-bin/material/add_material")
                .query_param("access_token", "T1");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "media_id": "MEDIA1", "url": "https://mmbiz/x" }));
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.jpg");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"\xff\xd8fakejpeg")
            .unwrap();

        let client = client_for(&server);
        let media_id = client
            .materials()
            .upload_permanent(MediaType::Image, &path)
            .await
            .unwrap();

        assert_eq!(media_id, "MEDIA1");
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn temporary_download_returns_bytes() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET)
                .path("/cgi-bin/media/get")
                .query_param("media_id", "MEDIA1");
            then.status(200)
                .header("Content-Type", "image/jpeg")
                .body(b"binary-image-bytes");
        });

        let client = client_for(&server);
        let bytes = client.materials().download_temporary("MEDIA1").await.unwrap();
        assert_eq!(&bytes[..], b"binary-image-bytes");
    }

    #[tokio::test]
    async fn hd_voice_download_hits_the_jssdk_endpoint() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let fetch = server.mock(|when, then| {
            when.method(GET)
                .path("/cgi-bin/media/get/jssdk")
                .query_param("access_token", "T1")
                .query_param("media_id", "VOICE1");
            then.status(200)
                .header("Content-Type", "audio/speex")
                .body(b"hd-voice-bytes");
        });

        let client = client_for(&server);
        let bytes = client.materials().download_hd_voice("VOICE1").await.unwrap();
        assert_eq!(&bytes[..], b"hd-voice-bytes");
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_msg_dist_enforces_its_own_span() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let query = server.mock(|when, then| {
            when.method(POST)
                .path("/datacube/getupstreammsgdist")
                .json_body(json!({ "begin_date": "2026-08-01", "end_date": "2026-08-15" }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "list": [{ "count_interval": 1, "msg_user": 9 }] }));
        });

        let client = client_for(&server);
        let begin = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();

        // 14 days is inside the 15-day window for this endpoint
        let rows = client.stats().upstream_msg_dist(begin, end).await.unwrap();
        assert_eq!(rows[0]["msg_user"], 9);
        query.assert_async().await;

        // but too wide for the plain daily query's 7-day window
        match client.stats().upstream_msg(begin, end).await {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn download_decodes_json_error_envelope() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/cgi-bin/media/get");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({ "errcode": 40007, "errmsg": "invalid media_id" }));
        });

        let client = client_for(&server);
        match client.materials().download_temporary("BAD").await {
            Err(Error::Api { code, .. }) => assert_eq!(code, 40007),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn user_summary_sends_date_range() {
        let server = MockServer::start_async().await;
        mock_token(&server);
        let query = server.mock(|when, then| {
            when.method(POST)
                .path("/datacube/getusersummary")
                .json_body(json!({ "begin_date": "2026-08-20", "end_date": "2026-08-26" }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({
                    "list": [
                        { "ref_date": "2026-08-20", "new_user": 5, "cancel_user": 1 },
                    ]
                }));
        });

        let client = client_for(&server);
        let begin = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        let rows = client.stats().user_summary(begin, end).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["new_user"], 5);
        query.assert_async().await;
    }

    #[tokio::test]
    async fn oversized_date_span_never_reaches_the_network() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);
        let begin = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

        match client.stats().user_summary(begin, end).await {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }
}
