//! ICS feed download.

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

/// Parse a feed URL from a request. `webcal://` links are fetched over HTTPS.
pub fn feed_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    let rewritten = match raw.strip_prefix("webcal://") {
        Some(rest) => format!("https://{rest}"),
        None => raw.to_string(),
    };

    let url = Url::parse(&rewritten).map_err(|e| format!("Invalid icsUrl '{raw}': {e}"))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("Unsupported icsUrl scheme '{other}'")),
    }
}

#[derive(Clone)]
pub struct IcsClient {
    http: reqwest::Client,
}

impl IcsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nextevent/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(IcsClient { http })
    }

    /// GET the feed body. Non-2xx responses are errors; there is no retry.
    pub async fn download(&self, url: &Url) -> Result<String> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to download calendar from {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Calendar download from {url} returned {status}");
        }

        let body = response
            .text()
            .await
            .context("Failed to read calendar body")?;

        tracing::debug!(%url, bytes = body.len(), "downloaded calendar");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_accepts_http_and_webcal() {
        assert_eq!(
            feed_url("https://example.com/cal.ics").unwrap().as_str(),
            "https://example.com/cal.ics"
        );
        assert_eq!(
            feed_url("webcal://example.com/cal.ics").unwrap().as_str(),
            "https://example.com/cal.ics"
        );
        assert!(feed_url("http://localhost:8000/basic.ics").is_ok());
    }

    #[test]
    fn test_feed_url_rejects_bad_input() {
        assert!(feed_url("").is_err());
        assert!(feed_url("not a url").is_err());
        assert!(feed_url("ftp://example.com/cal.ics").is_err());
        assert!(feed_url("file:///etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_download_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/cal.ics")
            .with_status(200)
            .with_header("content-type", "text/calendar")
            .with_body("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n")
            .create_async()
            .await;

        let client = IcsClient::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/cal.ics", server.url())).unwrap();
        let body = client.download(&url).await.unwrap();

        assert!(body.starts_with("BEGIN:VCALENDAR"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_fails_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.ics")
            .with_status(404)
            .create_async()
            .await;

        let client = IcsClient::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!("{}/missing.ics", server.url())).unwrap();
        let err = client.download(&url).await.unwrap_err();

        assert!(err.to_string().contains("404"), "got: {err}");
    }
}
