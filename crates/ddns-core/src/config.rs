//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is immutable once the engine is built: the credential and TTL
//! are handed to every provider call rather than read from shared state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Domains;
use crate::error::{Error, Result};

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// TTL applied to every created or updated record
    #[serde(default)]
    pub ttl: Ttl,

    /// IPv4 (A record) settings
    #[serde(default = "FamilyConfig::default_ipv4")]
    pub ipv4: FamilyConfig,

    /// IPv6 (AAAA record) settings
    #[serde(default = "FamilyConfig::default_ipv6")]
    pub ipv6: FamilyConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a new configuration with defaults
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            ttl: Ttl::default(),
            ipv4: FamilyConfig::default_ipv4(),
            ipv6: FamilyConfig::default_ipv6(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.ipv4.validate("IPv4")?;
        self.ipv6.validate("IPv6")?;

        if self.ipv4.active_domains().is_empty() && self.ipv6.active_domains().is_empty() {
            return Err(Error::config("No domains configured for any enabled address family"));
        }

        if self.engine.interval_secs == 0 {
            return Err(Error::config("Update interval must be > 0"));
        }
        if self.engine.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        self.domains().map(|_| ())
    }

    /// Parse the configured domain strings of the enabled families
    pub fn domains(&self) -> Result<Domains> {
        Domains::parse(self.ipv4.active_domains(), self.ipv6.active_domains())
            .map_err(|e| Error::config(e.to_string()))
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DNSPod provider
    Dnspod {
        /// API token identity and secret
        credential: ProviderCredential,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Dnspod { credential } => credential.validate(),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Dnspod { .. } => "dnspod",
        }
    }

    /// The credential used to authenticate provider requests
    pub fn credential(&self) -> &ProviderCredential {
        match self {
            ProviderConfig::Dnspod { credential } => credential,
        }
    }
}

/// Identity/secret pair sent with every provider request
///
/// The Debug implementation intentionally does NOT expose the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredential {
    /// Token identity
    pub id: String,
    /// Token secret, never logged
    pub secret: String,
}

impl ProviderCredential {
    /// Create a credential
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    /// Both halves must be present
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::config("Provider credential id cannot be empty"));
        }
        if self.secret.trim().is_empty() {
            return Err(Error::config("Provider credential secret cannot be empty"));
        }
        Ok(())
    }

    /// The single form value `"{id},{secret}"`
    pub fn login_token(&self) -> String {
        format!("{},{}", self.id, self.secret)
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("id", &self.id)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

/// Record TTL in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TtlRepr", into = "u32")]
pub struct Ttl(u32);

impl Ttl {
    /// Used when no TTL is configured
    pub const DEFAULT_SECS: u32 = 600;

    /// Create a TTL, rejecting zero
    pub fn new(secs: u32) -> Result<Self> {
        if secs == 0 {
            return Err(Error::config("TTL must be greater than 0"));
        }
        Ok(Self(secs))
    }

    /// Seconds
    pub fn as_secs(self) -> u32 {
        self.0
    }
}

impl Default for Ttl {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Empty string means "use the default"
impl FromStr for Ttl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let secs: u32 = s
            .parse()
            .map_err(|_| Error::config(format!("TTL must be a number of seconds. Got: '{}'", s)))?;
        Self::new(secs)
    }
}

impl From<Ttl> for u32 {
    fn from(ttl: Ttl) -> Self {
        ttl.0
    }
}

/// TTLs may be written as numbers or strings in config files
#[derive(Deserialize)]
#[serde(untagged)]
enum TtlRepr {
    Number(u32),
    Text(String),
}

impl TryFrom<TtlRepr> for Ttl {
    type Error = Error;

    fn try_from(repr: TtlRepr) -> Result<Self> {
        match repr {
            TtlRepr::Number(secs) => Ttl::new(secs),
            TtlRepr::Text(text) => text.parse(),
        }
    }
}

/// Per address family settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    /// Whether this family is reconciled at all
    pub enabled: bool,

    /// Echo service URL that returns the public address of this family
    #[serde(default)]
    pub url: String,

    /// Domain strings that receive this family's records
    #[serde(default)]
    pub domains: Vec<String>,
}

impl FamilyConfig {
    /// Default IPv4 echo service
    pub const DEFAULT_IPV4_URL: &'static str = "https://api-ipv4.ip.sb/ip";

    /// Default IPv6 echo service
    pub const DEFAULT_IPV6_URL: &'static str = "https://api-ipv6.ip.sb/ip";

    /// IPv4 enabled, no domains
    pub fn default_ipv4() -> Self {
        Self {
            enabled: true,
            url: Self::DEFAULT_IPV4_URL.to_string(),
            domains: Vec::new(),
        }
    }

    /// IPv6 disabled, no domains
    pub fn default_ipv6() -> Self {
        Self {
            enabled: false,
            url: Self::DEFAULT_IPV6_URL.to_string(),
            domains: Vec::new(),
        }
    }

    /// Domains to reconcile, empty when the family is disabled
    pub fn active_domains(&self) -> &[String] {
        if self.enabled { &self.domains } else { &[] }
    }

    fn validate(&self, label: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.url.trim().is_empty() {
            return Err(Error::config(format!("{} URL cannot be empty when enabled", label)));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(Error::config(format!(
                "{} URL must use HTTP or HTTPS scheme. Got: {}",
                label, self.url
            )));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between reconciliation passes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log) instead of
    /// blocking the reconciliation pass.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    1000
}
