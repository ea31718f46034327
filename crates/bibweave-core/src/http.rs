//! Shared HTTP client and async-to-sync bridge.
//!
//! Workers are plain threads; reqwest is async. All HTTP goes through one
//! pooled client driven by a small shared tokio runtime via `block_on`.

use std::sync::LazyLock;
use std::time::Duration;

/// Per-request timeout covering connect + response body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect timeout for the shared client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Get the shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Plain GET returning the response body as text (listing pages, not JSON APIs).
pub fn get_text(url: &str) -> Result<String, reqwest::Error> {
    SHARED_RUNTIME.handle().block_on(async {
        let resp = http_client()
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        resp.text().await
    })
}
