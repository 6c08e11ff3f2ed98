// # DNS Provider Trait
//
// Defines the interface for reading and writing DNS records via a provider API.
//
// ## Implementations
//
// - DNSPod: `ddns-provider-dnspod` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, DnsProvider, Domain, Ttl};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//     let domain = Domain::parse("www.example.com")?;
//
//     let records = provider.list_records(&domain, AddressFamily::Ipv4).await?;
//     if records.is_empty() {
//         let status = provider
//             .create_record(&domain, AddressFamily::Ipv4, "1.2.3.4".parse()?, Ttl::default())
//             .await?;
//         println!("create: {}", status);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::config::Ttl;
use crate::domain::Domain;
use crate::traits::AddressFamily;

/// A record that already exists at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    /// Provider-assigned identifier, required to update the record in place
    pub id: String,
    /// Record name as the provider reports it
    pub name: String,
    /// Current value (an IP address in text form)
    pub value: String,
    /// Whether the record is enabled at the provider
    pub enabled: bool,
}

impl ExistingRecord {
    /// Whether this record already points at `ip`
    ///
    /// Values that parse as addresses are compared as addresses, so
    /// differently formatted IPv6 text still matches. Anything else is
    /// compared as a string.
    pub fn points_to(&self, ip: &IpAddr) -> bool {
        match self.value.trim().parse::<IpAddr>() {
            Ok(current) => current == *ip,
            Err(_) => self.value == ip.to_string(),
        }
    }
}

/// Status envelope carried by every provider response
///
/// Codes are opaque strings. Only [`ProviderStatus::SUCCESS_CODE`] means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Provider-defined status code
    #[serde(default)]
    pub code: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

impl ProviderStatus {
    /// The code the provider uses for success
    pub const SUCCESS_CODE: &'static str = "1";

    /// Create a status from code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Exact string match against the success code
    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS_CODE
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code: {}, Message: {}", self.code, self.message)
    }
}

/// Trait for DNS provider implementations
///
/// Each method maps to exactly one provider API call. Providers do not
/// decide whether a write is needed (the engine does), do not retry, and do
/// not cache records between calls.
///
/// # Errors
///
/// Transport failures and undecodable responses are returned as `Err`.
/// A response that decodes but carries a non-success status code is
/// returned as `Ok(status)` so the engine can log the provider's own
/// code and message.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the records of `family` that exist for `domain`
    ///
    /// An empty list is a normal answer meaning "nothing to update, create one".
    async fn list_records(
        &self,
        domain: &Domain,
        family: AddressFamily,
    ) -> Result<Vec<ExistingRecord>, crate::Error>;

    /// Create a new record for `domain` pointing at `ip`
    async fn create_record(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        ttl: Ttl,
    ) -> Result<ProviderStatus, crate::Error>;

    /// Point the existing `record` of `domain` at `ip`
    async fn update_record(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        record: &ExistingRecord,
        ttl: Ttl,
    ) -> Result<ProviderStatus, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
