// nugs-net/src/http.rs
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use nugs_common::config::Config;
use nugs_common::error::{NugsError, Result};

const USER_AGENT_STRING: &str = "nugs NuGet downloader (Rust)";

/// Client shared by metadata and artifact requests. Every request is bounded
/// by the configured request and connect timeouts; hitting one surfaces as an
/// ordinary request error.
pub fn build_http_client(config: &Config) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(NugsError::from)
}

/// GETs `url` and decodes the body as JSON. A 404 is `NotFound`; a body that
/// does not decode into `T` is `MalformedMetadata` for `subject`. Transport
/// failures, timeouts included, come back as `NugsError::Http`.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &Url, subject: &str) -> Result<T> {
    debug!("Fetching data from: {}", url);
    let response = client.get(url.clone()).send().await.map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        NugsError::from(e)
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if status == StatusCode::NOT_FOUND {
        return Err(NugsError::NotFound(subject.to_string()));
    }
    if !status.is_success() {
        return Err(NugsError::HttpError(format!("HTTP error {status} for URL {url}")));
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| NugsError::MalformedMetadata(subject.to_string(), e.to_string()))
}

/// GETs `url` and returns the whole body.
pub async fn get_bytes(client: &Client, url: &Url, subject: &str) -> Result<Vec<u8>> {
    debug!("Downloading {} from {}", subject, url);
    let response = client.get(url.clone()).send().await.map_err(|e| {
        NugsError::DownloadError(subject.to_string(), url.to_string(), e.to_string())
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        let reason = match status {
            StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
            StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
            _ => format!("HTTP error {status}"),
        };
        return Err(NugsError::DownloadError(
            subject.to_string(),
            url.to_string(),
            reason,
        ));
    }

    let content = response.bytes().await.map_err(|e| {
        NugsError::DownloadError(
            subject.to_string(),
            url.to_string(),
            format!("Failed to read response body bytes: {e}"),
        )
    })?;
    Ok(content.to_vec())
}
