// # IP Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, IpSource};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     match source.current(AddressFamily::Ipv6).await? {
//         Some(ip) => println!("public IPv6: {}", ip),
//         None => println!("IPv6 not configured"),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address family, mapped to the provider's record type vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4, published as A records
    Ipv4,
    /// IPv6, published as AAAA records
    Ipv6,
}

impl AddressFamily {
    /// Families in the order a reconciliation pass visits them
    pub const ALL: [AddressFamily; 2] = [AddressFamily::Ipv4, AddressFamily::Ipv6];

    /// The DNS record type for this family
    pub fn record_type(self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "A",
            AddressFamily::Ipv6 => "AAAA",
        }
    }

    /// The family an address belongs to
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::Ipv4,
            IpAddr::V6(_) => AddressFamily::Ipv6,
        }
    }

    /// Whether `ip` belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        Self::of(ip) == self
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.record_type())
    }
}

/// Trait for IP source implementations
///
/// The source answers one question: which address should the records of a
/// given family point at right now?
///
/// # Return values
///
/// - `Ok(Some(ip))`: reconcile the family's domains against `ip`
/// - `Ok(None)`: the family is disabled or unavailable; the engine skips it
/// - `Err(_)`: lookup failed; the engine logs it and skips the family
///
/// Implementations perform at most one lookup per call and never retry.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public address for `family`
    async fn current(&self, family: AddressFamily) -> Result<Option<IpAddr>, crate::Error>;

    /// Name used in log lines
    fn source_name(&self) -> &'static str;
}
