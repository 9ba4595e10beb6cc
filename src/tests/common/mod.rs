use std::net::SocketAddr;

use axum::Router;
use tokio::task::JoinHandle;

use crate::auth::storage::MemoryStorage;
use crate::client::WechatClient;

pub const TEST_APPID: &str = "wx-test-appid";
pub const TEST_SECRET: &str = "test-secret";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Client against a mock server, with in-memory credential storage so tests
/// never touch the filesystem.
pub fn build_client(base_url: &str) -> WechatClient {
    WechatClient::builder()
        .app_id(TEST_APPID)
        .app_secret(TEST_SECRET)
        .base_url(base_url)
        .storage(Box::new(MemoryStorage::new()))
        .build()
        .expect("client builds")
}

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}
