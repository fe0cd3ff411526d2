use anyhow::{Context, Result};
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::error::LandingError;

/// Russian Wikipedia "Список прилунений", soft landings section.
pub const LANDINGS_URL: &str = "https://ru.wikipedia.org/wiki/%D0%A1%D0%BF%D0%B8%D1%81%D0%BE%D0%BA_%D0%BF%D1%80%D0%B8%D0%BB%D1%83%D0%BD%D0%B5%D0%BD%D0%B8%D0%B9#%D0%A1%D0%BF%D0%B8%D1%81%D0%BE%D0%BA_%D0%BC%D1%8F%D0%B3%D0%BA%D0%B8%D1%85_%D0%BF%D0%BE%D1%81%D0%B0%D0%B4%D0%BE%D0%BA";

pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("lunar_landings/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// GET `url` and return the body on 200, `None` on any other status.
/// Connection errors are returned as `Err`.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<Option<String>> {
    info!("Fetching {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", url))?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!("{} answered with status {}", url, status);
        return Ok(None);
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read body of {}", url))?;
    info!("Fetched {} bytes", body.len());
    Ok(Some(body))
}

/// Turn the absence marker from [`fetch_page`] into a fatal error.
pub fn require_page(url: &str, page: Option<String>) -> Result<String, LandingError> {
    page.ok_or_else(|| LandingError::FetchFailed {
        url: url.to_string(),
    })
}
