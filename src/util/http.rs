//! HTTP client construction.

use std::time::Duration;

/// Default per-request timeout for device and API calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(8);

/// Build a reqwest client with a bounded per-request timeout.
///
/// Every remote call in the crate goes through a client built here, so
/// a wedged device or API cannot stall a polling tick indefinitely.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}
