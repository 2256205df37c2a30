// src/health/http.rs
use super::{CheckError, CheckOutcome, ReadinessCheck};
use crate::config::HttpCheckConfig;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

/// GETs every configured URL in order; any status code counts as up as long
/// as the body can be read.
pub struct HttpCheck {
    config: HttpCheckConfig,
}

impl HttpCheck {
    pub fn new(config: HttpCheckConfig) -> Self {
        if !config.urls.is_empty() && config.insecure_skip_verify {
            warn!("TLS certificate verification is disabled for HTTP readiness checks");
        }
        Self { config }
    }

    fn client(&self) -> Result<Client, CheckError> {
        // Endpoints behind self-signed certificates are common inside a
        // cluster, hence the opt-out.
        Client::builder()
            .timeout(self.config.timeout())
            .danger_accept_invalid_certs(self.config.insecure_skip_verify)
            .build()
            .map_err(|e| CheckError::transport("HTTP client", e))
    }
}

#[async_trait]
impl ReadinessCheck for HttpCheck {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_configured(&self) -> bool {
        !self.config.urls.is_empty()
    }

    async fn check(&self) -> Result<CheckOutcome, CheckError> {
        if !self.is_configured() {
            info!("skipping HTTP readiness check");
            return Ok(CheckOutcome::Skipped);
        }

        info!(urls = self.config.urls.len(), "validating HTTP readiness check");
        let client = self.client()?;

        for url in &self.config.urls {
            let response = client
                .get(url.as_str())
                .send()
                .await
                .map_err(|e| CheckError::transport(url.as_str(), e))?;

            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| CheckError::response(url.as_str(), e))?;

            debug!(url = %url, status = status.as_u16(), bytes = body.len(), "response received");
            info!(url = %url, "output: {}", String::from_utf8_lossy(&body));
        }

        info!("all HTTP readiness checks passed");
        Ok(CheckOutcome::Passed)
    }
}
