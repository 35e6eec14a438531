//! Remote image fetching.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

/// The body and declared media type of a fetched image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {detail}")]
    Request { url: String, detail: String },
    #[error("request to {url} failed with HTTP status {status}")]
    Status { url: String, status: u16 },
}

/// Downloads a remote image referenced by a diagram.
pub trait ImageFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the image cannot be retrieved.
    fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher. With `timeout` unset a request may wait forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        // reqwest's blocking client defaults to a 30s timeout; `None` clears it.
        let client = Client::builder()
            .user_agent(concat!("mermaid-export/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedImage, FetchError> {
        let request_error = |err: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            detail: err.to_string(),
        };

        let response = self.client.get(url.as_str()).send().map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().map_err(request_error)?.to_vec();

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}
