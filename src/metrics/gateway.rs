//! Pushgateway transport

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{MonitorError, Result};

const PUSH_TIMEOUT: Duration = Duration::from_secs(10);
const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Destination for rendered metric batches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Replace every metric of `job` with `body`
    async fn push(&self, job: &str, body: String) -> Result<()>;
}

/// Prometheus Pushgateway over HTTP
#[derive(Clone)]
pub struct HttpPushGateway {
    client: Client,
    base_url: String,
}

impl HttpPushGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(PUSH_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn job_url(&self, job: &str) -> String {
        format!("{}/metrics/job/{}", self.base_url, job)
    }
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn push(&self, job: &str, body: String) -> Result<()> {
        let url = self.job_url(job);
        let resp = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        if resp.status().is_success() {
            debug!(url = %url, "metrics pushed");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(MonitorError::Metrics(format!("HTTP {}: {}", status, body)))
        }
    }
}
