//! Blocking HTTP downloads for image URLs given in the config.

use reqwest::blocking::Client;
use slidematch::{Downloader, SlideError, SlideResult};
use std::time::Duration;

pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&mut self, url: &str) -> SlideResult<Vec<u8>> {
        let failure = |reason: String| SlideError::DownloadFailure {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|err| failure(err.to_string()))?;
        let bytes = response.bytes().map_err(|err| failure(err.to_string()))?;
        tracing::info!(url, bytes = bytes.len(), "downloaded");
        Ok(bytes.to_vec())
    }
}

pub fn is_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}
