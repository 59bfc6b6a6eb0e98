use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, USER_AGENT,
};
use reqwest::Client;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::{GroupId, Result, BROWSER_USER_AGENT};

/// One network attempt for one id: pull the remote asset and write it to `dest`.
///
/// Implementations only report success once the body is completely on disk.
/// Existence checks, retries and renaming are the caller's business.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, id: GroupId, dest: &Path) -> Result<()>;
}

/// Streams group logos from the image host.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: Client,
    base_url: String,
}

impl HttpAssetFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, id: GroupId) -> String {
        format!("{}/{id}.gif", self.base_url)
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, id: GroupId, dest: &Path) -> Result<()> {
        let res = self.client.get(self.url(id)).send().await?.error_for_status()?;

        let mut file = File::create(dest).await?;
        let mut body = res.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Headers an image request from a desktop browser would carry.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_derived_from_id() {
        let fetcher = HttpAssetFetcher::with_client(Client::new(), "http://img.test/groups/v1/");
        assert_eq!(fetcher.url(4590793), "http://img.test/groups/v1/4590793.gif");
    }

    #[test]
    fn browser_headers_are_complete() {
        let headers = browser_headers();
        assert_eq!(headers[USER_AGENT], BROWSER_USER_AGENT);
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
        assert!(headers.contains_key(DNT));
    }
}
