use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::{config::SourceHttpConfig, error::SourceError};

/// Outbound GET used by the network adapters. One call, one request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_text(&self, url: Url) -> Result<String, SourceError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &SourceHttpConfig, allow_insecure_transports: bool) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .danger_accept_invalid_certs(allow_insecure_transports)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: Url) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound);
        }
        if !status.is_success() {
            return Err(SourceError::Transport(format!("upstream returned {status}")));
        }
        Ok(response.text().await?)
    }
}
