// # HTTP IP Source
//
// This crate provides the HTTP-based IP source for the DDNS system.
//
// ## Architecture
//
// Each address family has its own echo service (e.g. `api-ipv4.ip.sb/ip`)
// that answers a GET with the caller's public address as plain text.
// Lookups happen once per reconciliation pass; nothing is cached between
// passes, so an address change is picked up on the next pass.
//
// ## Semantics
//
// - Family disabled → `Ok(None)`, no request is made
// - Body contains an address of the family → `Ok(Some(ip))`
// - Anything else (transport, HTTP status, no usable address) → `Err`

use ddns_core::config::{DdnsConfig, FamilyConfig};
use ddns_core::traits::{AddressFamily, IpSource};
use ddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Timeout for a single echo-service request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based IP source
pub struct HttpIpSource {
    /// Echo URL for IPv4, None when the family is disabled
    ipv4_url: Option<String>,

    /// Echo URL for IPv6, None when the family is disabled
    ipv6_url: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `ipv4_url`: echo service for IPv4 (None = never look up IPv4)
    /// - `ipv6_url`: echo service for IPv6 (None = never look up IPv6)
    pub fn new(ipv4_url: Option<String>, ipv6_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ipv4_url,
            ipv6_url,
            client,
        })
    }

    /// Create a source for the enabled families of `config`
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        fn url_of(family: &FamilyConfig) -> Option<String> {
            family.enabled.then(|| family.url.clone())
        }

        Self::new(url_of(&config.ipv4), url_of(&config.ipv6))
    }

    fn url_for(&self, family: AddressFamily) -> Option<&str> {
        match family {
            AddressFamily::Ipv4 => self.ipv4_url.as_deref(),
            AddressFamily::Ipv6 => self.ipv6_url.as_deref(),
        }
    }

    /// Fetch the echo service body
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response from {}: {}", url, e)))
    }
}

/// First token of `body` that is an address of `family`
///
/// Tokens are runs of hex digits, dots and colons, so decorated bodies such
/// as `IP：1.2.3.4 from ...` work as well as bare addresses.
fn extract_address(body: &str, family: AddressFamily) -> Option<IpAddr> {
    body.split(|c: char| !(c.is_ascii_hexdigit() || c == '.' || c == ':'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            token
                .parse::<IpAddr>()
                .ok()
                .or_else(|| token.trim_matches(['.', ':']).parse().ok())
        })
        .find(|ip| family.matches(ip))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, family: AddressFamily) -> Result<Option<IpAddr>> {
        let Some(url) = self.url_for(family) else {
            return Ok(None);
        };

        let body = self.fetch(url).await?;
        match extract_address(&body, family) {
            Some(ip) => {
                tracing::debug!("Public {} address from {}: {}", family, url, ip);
                Ok(Some(ip))
            }
            None => Err(Error::ip_source(format!(
                "{} did not return a valid {} address: {:?}",
                url,
                family,
                body.trim()
            ))),
        }
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
