//! Plain HTTP implementation of [`Fetcher`].
//!
//! Treats the camera endpoint as a direct image URL and sends the browser-like
//! headers configured under `[fetch]`. Pages that need script execution to
//! reveal their image stay the job of a browser-automation fetcher.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::header::{ACCEPT, ORIGIN, REFERER};

use super::fetcher::Fetcher;
use crate::configuration::types::FetchSettings;
use crate::error_handling::types::FetchError;

pub struct HttpFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Failed(format!("unable to build HTTP client: {}", e)))?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, endpoint: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let mut request = self
            .client
            .get(endpoint)
            .timeout(timeout)
            .header(ACCEPT, self.settings.accept.as_str());
        if let Some(referer) = &self.settings.referer {
            request = request.header(REFERER, referer.as_str());
        }
        if let Some(origin) = &self.settings.origin {
            request = request.header(ORIGIN, origin.as_str());
        }

        debug!("GET {}", endpoint);
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Failed(format!("HTTP {} from {}", status, endpoint)));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if body.is_empty() {
            return Err(FetchError::Failed(format!("empty body from {}", endpoint)));
        }
        trace!("{} bytes from {}", body.len(), endpoint);
        Ok(body.to_vec())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Failed(err.to_string())
    }
}
