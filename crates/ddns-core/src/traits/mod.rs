//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that collaborators implement.
//!
//! - [`IpSource`]: Supplies the desired address per address family
//! - [`DnsProvider`]: Lists, creates and updates records via a provider API

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{AddressFamily, IpSource};
pub use dns_provider::{DnsProvider, ExistingRecord, ProviderStatus};
