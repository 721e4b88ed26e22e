//! Image enrichment adapter for an Unsplash-compatible search service.
//!
//! The query is built from the brand only ("{brand} car") — deliberately
//! dropping the model to widen recall — and only the first result is used.

pub mod error;

use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

pub use error::{Error, Result};

/// A reference to an externally hosted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    urls: ResultUrls,
}

#[derive(Debug, Deserialize)]
struct ResultUrls {
    regular: String,
}

/// HTTP client for the image-search service.
pub struct UnsplashImageSearch {
    client: reqwest::Client,
    base_url: String,
    access_key: Secret<String>,
    timeout: Duration,
}

impl UnsplashImageSearch {
    pub fn new(base_url: impl Into<String>, access_key: Secret<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            access_key,
            timeout,
        }
    }

    /// Search for an image of the given brand. `Ok(None)` when the result
    /// set is empty, so callers can answer gracefully instead of erroring.
    pub async fn find_image(&self, brand: &str) -> Result<Option<MediaRef>> {
        let query = format!("{brand} car");
        let url = format!(
            "{}/search/photos?query={}&client_id={}&per_page=1",
            self.base_url,
            urlencoding::encode(&query),
            self.access_key.expose_secret(),
        );
        let response = self.client.get(&url).timeout(self.timeout).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        let media = parsed
            .results
            .into_iter()
            .next()
            .map(|r| MediaRef { url: r.urls.regular });
        debug!(brand, found = media.is_some(), "image search complete");
        Ok(media)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(base_url: &str) -> UnsplashImageSearch {
        UnsplashImageSearch::new(
            base_url,
            Secret::new("test-key".to_string()),
            Duration::from_secs(2),
        )
    }

    #[tokio::test]
    async fn returns_the_first_result_only() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results": [
                    {"urls": {"regular": "https://img.example/one.jpg"}},
                    {"urls": {"regular": "https://img.example/two.jpg"}}
                ]}"#,
            )
            .create_async()
            .await;

        let media = search(&server.url()).find_image("Tesla").await.unwrap();
        assert_eq!(media.unwrap().url, "https://img.example/one.jpg");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_results_are_not_found_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"results": []}"#)
            .create_async()
            .await;

        let media = search(&server.url()).find_image("BrandX").await.unwrap();
        assert!(media.is_none());
    }

    #[tokio::test]
    async fn service_error_is_a_hard_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = search(&server.url()).find_image("Tesla").await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 500, .. }));
    }
}
