//! Getting bytes from urls.

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::{collections::HashMap, fmt::Debug, time::Duration};

/// A boxed error returned by a [Fetch] implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Retrieves the raw bytes behind a url.
///
/// The [SchemaCache](crate::SchemaCache) only ever touches the network
/// through this trait, so tests (or offline users) can swap in a fixed set of
/// documents with [MemoryFetcher].
#[async_trait]
pub trait Fetch: Debug + Send + Sync {
    /// Fetches the bytes at `url`.
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, BoxError>;
}

/// Fetches over http(s) with [reqwest].
#[derive(Debug, Clone)]
pub struct HttpFetcher(Client);

/// Serves a fixed set of documents from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher(HashMap<String, Bytes>);

impl HttpFetcher {
    /// Creates a new http fetcher whose requests give up after `timeout`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::HttpFetcher;
    /// use std::time::Duration;
    ///
    /// let fetcher = HttpFetcher::new(Duration::from_secs(10)).unwrap();
    /// ```
    pub fn new(timeout: Duration) -> Result<HttpFetcher> {
        let client = Client::builder()
            .user_agent(crate::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(HttpFetcher(client))
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, BoxError> {
        tracing::debug!("getting {url}");
        let response = self.0.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes)
    }
}

impl MemoryFetcher {
    /// Creates an empty memory fetcher.
    pub fn new() -> MemoryFetcher {
        MemoryFetcher::default()
    }

    /// Adds a JSON document at `url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ceos_ard_validate::MemoryFetcher;
    /// use serde_json::json;
    ///
    /// let fetcher = MemoryFetcher::new().with_json("https://ceos-ard.test/schema.json", json!({}));
    /// ```
    pub fn with_json(self, url: impl ToString, value: serde_json::Value) -> MemoryFetcher {
        self.with_bytes(url, value.to_string())
    }

    /// Adds raw bytes at `url`.
    pub fn with_bytes(mut self, url: impl ToString, bytes: impl Into<Bytes>) -> MemoryFetcher {
        let _ = self.0.insert(url.to_string(), bytes.into());
        self
    }
}

#[async_trait]
impl Fetch for MemoryFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<Bytes, BoxError> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| format!("not found: {url}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::{Fetch, HttpFetcher, MemoryFetcher};
    use crate::{Error, SchemaCache};
    use serde_json::json;
    use std::{io::Write, time::Duration};

    #[tokio::test]
    async fn http_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/schema.json")
            .with_status(200)
            .with_body(r#"{"type": "object"}"#)
            .create_async()
            .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let bytes = fetcher
            .fetch(&format!("{}/schema.json", server.url()))
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"type": "object"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.json")
            .with_status(404)
            .create_async()
            .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let _ = fetcher
            .fetch(&format!("{}/missing.json", server.url()))
            .await
            .unwrap_err();
    }

    #[tokio::test]
    async fn http_timeout() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/slow.json")
            .with_status(200)
            .with_chunked_body(|writer| {
                std::thread::sleep(Duration::from_secs(2));
                writer.write_all(b"{}")
            })
            .create_async()
            .await;
        let url = format!("{}/slow.json", server.url());
        let fetcher = HttpFetcher::new(Duration::from_millis(200)).unwrap();
        let _ = fetcher.fetch(&url).await.unwrap_err();

        let cache = SchemaCache::new(fetcher);
        let error = cache.fetch(&url).await.unwrap_err();
        assert!(matches!(error, Error::SchemaFetch { url: u, .. } if u == url));
    }

    #[tokio::test]
    async fn http_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/schema.json")
            .with_status(200)
            .with_body(r#"{"type": "#)
            .create_async()
            .await;
        let url = format!("{}/schema.json", server.url());
        let cache = SchemaCache::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());
        let error = cache.fetch(&url).await.unwrap_err();
        assert!(
            matches!(error, Error::SchemaFetch { cause, .. } if cause.starts_with("malformed json"))
        );
    }

    #[tokio::test]
    async fn memory() {
        let fetcher = MemoryFetcher::new().with_json("https://ceos-ard.test/a.json", json!(true));
        assert_eq!(
            &fetcher.fetch("https://ceos-ard.test/a.json").await.unwrap()[..],
            b"true"
        );
        let error = fetcher
            .fetch("https://ceos-ard.test/b.json")
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "not found: https://ceos-ard.test/b.json");
    }
}
