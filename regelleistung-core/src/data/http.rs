//! Blocking reqwest transport for the tender API.

use super::provider::{DataError, HttpResponse, HttpTransport};
use crate::config::ClientConfig;
use tracing::debug;

/// Default transport: one blocking reqwest client, no retries.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, DataError> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(config.user_agent.clone());
        // The blocking client defaults to a 30s timeout, so clear it explicitly.
        builder = builder.timeout(config.timeout());

        let client = builder
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = resp.status();
        debug!(%url, status = status.as_u16(), "tender download responded");

        if status != reqwest::StatusCode::OK {
            return Ok(HttpResponse::status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .map_err(|e| DataError::Network(format!("failed to read body from {url}: {e}")))?;
        Ok(HttpResponse::ok(body.to_vec()))
    }
}
