//! Managed domains and their update outcome
//!
//! A [`Domain`] is a root domain plus an optional subdomain, and carries the
//! [`UpdateStatus`] of the last write the engine attempted for it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::traits::AddressFamily;

/// Subdomain placeholder the provider uses for the zone apex
pub const APEX_SUBDOMAIN: &str = "@";

/// Two-label public suffixes under which the registrable domain has three labels
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "com.cn", "net.cn", "org.cn", "gov.cn", "edu.cn", "com.hk", "co.uk", "org.uk", "com.au",
    "co.jp",
];

/// Outcome of the last write attempted for a domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    /// No write has been attempted yet
    #[default]
    Unset,
    /// The provider accepted the last write
    Success,
    /// The last write was rejected or never got an answer
    Failed,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateStatus::Unset => "unset",
            UpdateStatus::Success => "success",
            UpdateStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A fully-qualified name to manage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Registrable domain, e.g. `example.com`
    pub domain_name: String,
    /// Labels left of the domain name, e.g. `www`; empty for the apex
    pub sub_domain: String,
    /// Outcome of the last write attempted for this domain
    #[serde(default)]
    pub update_status: UpdateStatus,
}

impl Domain {
    /// Create a domain from explicit parts
    pub fn new(domain_name: impl Into<String>, sub_domain: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            sub_domain: sub_domain.into(),
            update_status: UpdateStatus::Unset,
        }
    }

    /// Parse a configured domain string
    ///
    /// Accepted forms:
    /// - `sub:example.com` splits explicitly at the colon
    /// - `www.example.com` takes the last two labels as the domain name
    /// - `www.example.com.cn` takes three labels for known two-label suffixes
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('.');
        if trimmed.is_empty() {
            return Err(Error::invalid_input("Domain name cannot be empty"));
        }

        if let Some((sub, root)) = trimmed.split_once(':') {
            let sub = sub.trim();
            let root = root.trim();
            validate_labels(root, input)?;
            if root.split('.').count() < 2 {
                return Err(Error::invalid_input(format!(
                    "Domain name needs at least two labels: '{}'",
                    input
                )));
            }
            if !sub.is_empty() && sub != APEX_SUBDOMAIN {
                validate_labels(sub, input)?;
            }
            let sub = if sub == APEX_SUBDOMAIN { "" } else { sub };
            return Ok(Self::new(root, sub));
        }

        validate_labels(trimmed, input)?;
        let labels: Vec<&str> = trimmed.split('.').collect();
        if labels.len() < 2 {
            return Err(Error::invalid_input(format!(
                "Domain name needs at least two labels: '{}'",
                input
            )));
        }

        let last_two = labels[labels.len() - 2..].join(".");
        let root_len = if labels.len() >= 3
            && TWO_LABEL_SUFFIXES.contains(&last_two.to_ascii_lowercase().as_str())
        {
            3
        } else {
            2
        };

        let split = labels.len() - root_len;
        Ok(Self::new(labels[split..].join("."), labels[..split].join(".")))
    }

    /// The subdomain as the provider expects it (`@` for the apex)
    pub fn sub_domain(&self) -> &str {
        if self.sub_domain.is_empty() {
            APEX_SUBDOMAIN
        } else {
            &self.sub_domain
        }
    }

}

/// The fully-qualified name, e.g. `www.example.com`
impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sub_domain.is_empty() {
            f.write_str(&self.domain_name)
        } else {
            write!(f, "{}.{}", self.sub_domain, self.domain_name)
        }
    }
}

fn validate_labels(name: &str, input: &str) -> Result<()> {
    if name.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            name.len(),
            input
        )));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Domain name has empty label: '{}'",
                input
            )));
        }
        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }
        // `*` allows wildcard records such as `*.example.com`
        if !label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '*')
        {
            return Err(Error::invalid_input(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// The domains managed for each address family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domains {
    /// Domains that receive A records
    pub ipv4: Vec<Domain>,
    /// Domains that receive AAAA records
    pub ipv6: Vec<Domain>,
}

impl Domains {
    /// Parse both lists of configured domain strings
    pub fn parse<S: AsRef<str>>(ipv4: &[S], ipv6: &[S]) -> Result<Self> {
        let parse_all = |names: &[S]| -> Result<Vec<Domain>> {
            names.iter().map(|n| Domain::parse(n.as_ref())).collect()
        };

        Ok(Self {
            ipv4: parse_all(ipv4)?,
            ipv6: parse_all(ipv6)?,
        })
    }

    /// The domains of one family
    pub fn for_family(&self, family: AddressFamily) -> &[Domain] {
        match family {
            AddressFamily::Ipv4 => &self.ipv4,
            AddressFamily::Ipv6 => &self.ipv6,
        }
    }

    /// Mutable access to the domains of one family
    pub fn for_family_mut(&mut self, family: AddressFamily) -> &mut [Domain] {
        match family {
            AddressFamily::Ipv4 => &mut self.ipv4,
            AddressFamily::Ipv6 => &mut self.ipv6,
        }
    }

    /// Every domain paired with its family, A records first
    pub fn iter(&self) -> impl Iterator<Item = (AddressFamily, &Domain)> {
        self.ipv4
            .iter()
            .map(|d| (AddressFamily::Ipv4, d))
            .chain(self.ipv6.iter().map(|d| (AddressFamily::Ipv6, d)))
    }

    /// Total number of managed (family, domain) pairs
    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len()
    }

    /// True when no domain is managed for any family
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any domain ended its last write `Failed`
    pub fn any_failed(&self) -> bool {
        self.iter()
            .any(|(_, d)| d.update_status == UpdateStatus::Failed)
    }
}
