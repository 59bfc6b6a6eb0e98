//! Session headers for the job search API.
//!
//! The API only answers requests that carry the cookies a visit to the portal
//! hands out, plus a handful of fixed app headers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, SET_COOKIE,
    USER_AGENT,
};
use reqwest::Client;
use tracing::debug;

use crate::{Error, Result, BROWSER_USER_AGENT};

/// Produces the header set the job API requests are sent with.
#[async_trait]
pub trait SessionMinter: Send + Sync {
    async fn mint(&self) -> Result<HeaderMap>;
}

/// Visits the portal home page and keeps the cookies it sets.
#[derive(Debug, Clone)]
pub struct HomepageSession {
    client: Client,
    home_url: String,
}

impl HomepageSession {
    pub fn new(home_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            home_url: home_url.into(),
        })
    }
}

#[async_trait]
impl SessionMinter for HomepageSession {
    async fn mint(&self) -> Result<HeaderMap> {
        let res = self
            .client
            .get(&self.home_url)
            .send()
            .await?
            .error_for_status()?;

        let cookie = cookie_header(res.headers()).ok_or(Error::SessionNoCookies)?;
        debug!("Minted session with {} cookies", cookie.split("; ").count());
        api_headers(&cookie)
    }
}

/// Joins every `Set-Cookie` of a response into one `Cookie` value: `a=1; b=2`.
/// Attributes such as `Path` or `Expires` are dropped.
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}

/// Fixed app headers of the search API plus the session cookie.
pub fn api_headers(cookie: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        HeaderName::from_static("appid"),
        HeaderValue::from_static("109"),
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("gid"),
        HeaderValue::from_static("LOCATION,INDUSTRY,EDUCATION,FAREA_ROLE"),
    );
    headers.insert(
        HeaderName::from_static("priority"),
        HeaderValue::from_static("u=1, i"),
    );
    headers.insert(
        HeaderName::from_static("systemid"),
        HeaderValue::from_static("109"),
    );
    headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
    Ok(headers)
}
