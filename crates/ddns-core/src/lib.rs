// # ddns-core
//
// Core library for the DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the provider-independent half of dynamic DNS updates:
// - **IpSource**: Trait supplying the desired IP address per address family
// - **DnsProvider**: Trait for listing, creating and updating provider records
// - **Domain**: A managed name plus the outcome of its last write
// - **DdnsEngine**: Reconciles each domain's records with the desired IP
//
// ## Reconciliation
//
// For each address family (A, then AAAA) the engine asks the IP source for the
// desired address, lists the existing records of every domain, and then either
// creates a record (none exist) or updates every record whose value differs.
// Outcomes are tracked on the domain itself and read by the caller.
//
// ## Design Principles
//
// 1. **Separation of Concerns**: No HTTP code lives here; providers and IP
//    sources are separate crates
// 2. **Sequential**: One request in flight at a time, families and domains in order
// 3. **Single attempt**: Failures are recorded per domain, never retried in a pass
// 4. **Library-First**: The daemon is a thin shell over `DdnsEngine`

pub mod traits;
pub mod engine;
pub mod config;
pub mod domain;
pub mod error;

// Re-export core types for convenience
pub use traits::{AddressFamily, DnsProvider, ExistingRecord, IpSource, ProviderStatus};
pub use engine::{DdnsEngine, EngineEvent, FamilyOutcome};
pub use config::{DdnsConfig, EngineConfig, FamilyConfig, ProviderConfig, ProviderCredential, Ttl};
pub use domain::{Domain, Domains, UpdateStatus};
pub use error::{Error, Result};
