use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::FetchError;

/// Source of raw page text.
///
/// `expected_status` marks requests that are issued only for their
/// server-side effect and are answered with that status (a redirect) instead
/// of a rendered page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        context_id: &str,
        expected_status: Option<StatusCode>,
    ) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher sharing one cookie jar, and so one server session,
/// across every request.
pub struct HttpFetcher {
    client: Client,
    navigation: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config, site_base: &str) -> Result<Self, FetchError> {
        let base = Url::parse(site_base).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = &config.cookie {
            for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &base);
            }
        } else {
            warn!("No session cookie configured, StudOn will most likely serve the login page");
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()?;
        // Page switches answer with a 302 that must not be followed.
        let navigation = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_provider(jar)
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client, navigation })
    }
}

// Any success, or exactly the status a navigation request announced
fn status_accepted(status: StatusCode, expected: Option<StatusCode>) -> bool {
    status.is_success() || Some(status) == expected
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        context_id: &str,
        expected_status: Option<StatusCode>,
    ) -> Result<String, FetchError> {
        debug!(%url, context_id, ?expected_status, "fetching page");

        let client = match expected_status {
            Some(_) => &self.navigation,
            None => &self.client,
        };
        let resp = client.get(url).send().await?;

        let status = resp.status();
        if !status_accepted(status, expected_status) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(resp.text().await?)
    }
}
