use std::time::Duration;

use async_trait::async_trait;

use crate::error_handling::types::FetchError;

/// Capability that turns a camera endpoint into raw image bytes.
///
/// The capture core only depends on this trait. Implementations own whatever
/// heavy context they need (HTTP client, browser page) and must release it when
/// the returned future is dropped, which is how a timed-out capture cancels
/// its fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieves the image currently published at `endpoint`.
    ///
    /// `timeout` is the budget the caller will enforce; implementations may use
    /// it to configure their own deadlines and report [`FetchError::Timeout`].
    async fn fetch(&self, endpoint: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}
