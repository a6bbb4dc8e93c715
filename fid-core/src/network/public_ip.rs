//! Public IP lookup against a JSON echo service
//!
//! One GET, no retry. Every failure is logged and reported as absent.

use std::net::IpAddr;
use std::time::Duration;

use fid_error::{FortressError, Result};
use serde::Deserialize;
use tracing::{debug, error};

use crate::constants::public_ip::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};

/// Body of the echo service: `{ "ip": "..." }`
#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: String,
}

impl EchoResponse {
    fn address(&self) -> Result<IpAddr> {
        self.ip.trim().parse().map_err(|_| {
            FortressError::Http(format!("Echo service returned invalid address: {}", self.ip))
        })
    }
}

/// HTTP client for the echo endpoint
#[derive(Debug, Clone)]
pub struct PublicIpLookup {
    endpoint: String,
    client: reqwest::Client,
}

impl Default for PublicIpLookup {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl PublicIpLookup {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Address reported by the echo service, or `None` on any failure
    pub async fn lookup(&self) -> Option<IpAddr> {
        match self.fetch().await {
            Ok(ip) => {
                debug!("Public IP resolved: {}", ip);
                Some(ip)
            }
            Err(e) => {
                error!("Error fetching public IP from {}: {}", self.endpoint, e);
                None
            }
        }
    }

    async fn fetch(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| FortressError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FortressError::HttpStatus(status.as_u16()));
        }

        let echo: EchoResponse = response
            .json()
            .await
            .map_err(|e| FortressError::Http(format!("Failed to decode echo response: {}", e)))?;
        echo.address()
    }
}
