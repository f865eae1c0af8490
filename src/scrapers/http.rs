//! HTTP fetching behind a small trait so jobs can be tested without a network.

use crate::error::FetchError;
use crate::models::PageBody;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Something that can turn a URL into an HTML body.
pub trait Fetcher {
    /// GET `url` and return the raw body with its declared charset.
    /// Non-2xx responses are errors. Decoding is left to the caller so that
    /// malformed bytes are reported instead of replaced.
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError>;
}

/// [`Fetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
        let t0 = Instant::now();
        let network = |source| FetchError::Network {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Fetch returned non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_of);
        let bytes = response.bytes().await.map_err(network)?.to_vec();
        info!(
            bytes = bytes.len(),
            charset = charset.as_deref().unwrap_or("-"),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(PageBody { bytes, charset })
    }
}

/// `charset` parameter of a `Content-Type` value, unquoted.
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}
