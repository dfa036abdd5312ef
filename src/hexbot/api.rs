use async_trait::async_trait;

use crate::config::Config;
use crate::error::{HexbotError, HexbotResult};

const USER_AGENT: &str = concat!("hexbot/", env!("CARGO_PKG_VERSION"));

/// Anything that can hand back a raw Hexbot body. The worker pool is
/// generic over this so it never needs the network in tests.
#[async_trait]
pub trait ColorSource: Send + Sync {
    async fn fetch_body(&self) -> HexbotResult<String>;
}

/// `GET endpoint`, with `count=N` when more than the default single color is wanted.
pub fn request_url(endpoint: &str, color_count: Option<u32>) -> String {
    match color_count {
        Some(count) => {
            let separator = if endpoint.contains('?') { '&' } else { '?' };
            format!("{endpoint}{separator}count={count}")
        }
        None => endpoint.to_string(),
    }
}

#[derive(Clone)]
pub struct HexbotClient {
    client: reqwest::Client,
    url: String,
}

impl HexbotClient {
    pub fn new(config: &Config) -> HexbotResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: request_url(&config.endpoint, config.api_color_count),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ColorSource for HexbotClient {
    async fn fetch_body(&self) -> HexbotResult<String> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HexbotError::Status(status));
        }

        Ok(response.text().await?)
    }
}

/// Used by the one-shot program, which has no runtime to speak of.
pub struct BlockingHexbotClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl BlockingHexbotClient {
    pub fn new(config: &Config) -> HexbotResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: request_url(&config.endpoint, config.api_color_count),
        })
    }

    pub fn fetch_body(&self) -> HexbotResult<String> {
        let response = self.client.get(&self.url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(HexbotError::Status(status));
        }

        Ok(response.text()?)
    }
}
