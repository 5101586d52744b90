use std::time::Duration;

use scraper::Html;
use tracing::{error, info};

use crate::error::FetchError;

/// Something that turns a URL into a parsed HTML document.
pub trait PageFetcher {
    fn fetch_document(&self, url: &str) -> Result<Html, FetchError>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_document(&self, url: &str) -> Result<Html, FetchError> {
        info!("Fetching {}", url);

        let response = self.client.get(url).send().map_err(|source| {
            error!("Request to {} failed: {}", url, source);
            FetchError::Transport {
                url: url.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("{} returned HTTP {}", url, status.as_u16());
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Html::parse_document(&body))
    }
}
