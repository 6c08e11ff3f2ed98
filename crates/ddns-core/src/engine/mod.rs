//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Asking the IpSource for the desired address of each family
//! - Listing the records each domain already has at the provider
//! - Creating a record when none exists, updating the ones that differ
//! - Tracking the outcome of every write on the domain itself
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── desired IP (A, then AAAA) ───┐
//! └─────────────┘                                 │
//!                                                 ▼
//!                                        ┌──────────────┐
//!                                        │  DdnsEngine  │
//!                                        └──────────────┘
//!                                                 │
//!         ┌───────────────────────────────────────┼─────────────────────────┐
//!         │                                       │                         │
//!         ▼                                       ▼                         ▼
//! ┌──────────────┐                      ┌──────────────────┐       ┌─────────────┐
//! │ DnsProvider  │                      │ DnsProvider      │       │   Events    │
//! │ (list)       │                      │ (create/update)  │       │  (notify)   │
//! └──────────────┘                      └──────────────────┘       └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. For each family: get the desired IP, skip the family if there is none
//! 2. For each domain of the family, in order: list its records
//! 3. If the list call fails, abandon the rest of the family
//! 4. No records: create one. Otherwise update every record whose value differs
//! 5. Each write sets the domain's `UpdateStatus` (last write wins)
//!
//! Everything runs sequentially; there is never more than one provider call
//! in flight.

use std::net::IpAddr;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::{DdnsConfig, Ttl};
use crate::domain::{Domain, Domains, UpdateStatus};
use crate::error::{Error, Result};
use crate::traits::{AddressFamily, DnsProvider, ExistingRecord, IpSource, ProviderStatus};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// No desired IP for this family, nothing was requested
    FamilySkipped {
        family: AddressFamily,
    },

    /// The record list call failed; the rest of the family was abandoned
    QueryFailed {
        family: AddressFamily,
        domain: String,
        error: String,
        /// Domains after this one that were not processed
        skipped: usize,
    },

    /// A new record was created
    RecordCreated {
        family: AddressFamily,
        domain: String,
        ip: IpAddr,
    },

    /// An existing record was pointed at the new IP
    RecordUpdated {
        family: AddressFamily,
        domain: String,
        record_id: String,
        ip: IpAddr,
    },

    /// An existing record already had the desired IP
    RecordUnchanged {
        family: AddressFamily,
        domain: String,
        record_id: String,
        ip: IpAddr,
    },

    /// A create or update was rejected or never answered
    WriteFailed {
        family: AddressFamily,
        domain: String,
        /// Provider status code, if a response was decoded
        code: Option<String>,
        message: String,
    },

    /// Both families have been processed
    PassCompleted {
        succeeded: usize,
        failed: usize,
    },
}

/// How processing of one address family ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOutcome {
    /// No desired IP; no requests were issued
    Skipped,

    /// Every domain was queried
    Completed {
        /// Number of write requests issued
        writes: usize,
    },

    /// A record query failed and the remaining domains were not processed
    Aborted {
        /// The domain whose query failed
        domain: String,
        /// Why it failed
        error: String,
        /// Domains after it that were not processed
        skipped: usize,
    },
}

/// Core DDNS engine
///
/// The engine owns the domain lists so their statuses carry over from one
/// pass to the next: a pass that makes no write for a domain leaves whatever
/// the previous pass recorded.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Call [`DdnsEngine::reconcile_all()`] for a single pass, or
///    [`DdnsEngine::run_with_shutdown()`] to repeat passes until shutdown
/// 3. Read outcomes with [`DdnsEngine::domains()`]
pub struct DdnsEngine {
    /// Source of the desired address per family
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and writing records
    provider: Box<dyn DnsProvider>,

    /// Managed domains with their last outcome
    domains: Domains,

    /// TTL sent with every write
    ttl: Ttl,

    /// Seconds between passes in [`DdnsEngine::run_with_shutdown()`]
    interval_secs: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: &DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            domains: config.domains()?,
            ttl: config.ttl,
            interval_secs: config.engine.interval_secs,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// The managed domains and their current statuses
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    /// Run one full pass: IPv4 first, then IPv6
    ///
    /// Never fails: every problem ends up as a domain status, a log line
    /// and an event.
    pub async fn reconcile_all(&mut self) -> &Domains {
        for family in AddressFamily::ALL {
            self.run(family).await;
        }

        let (succeeded, failed) = self.domains.iter().fold((0, 0), |(ok, bad), (_, d)| {
            match d.update_status {
                UpdateStatus::Success => (ok + 1, bad),
                UpdateStatus::Failed => (ok, bad + 1),
                UpdateStatus::Unset => (ok, bad),
            }
        });
        for (family, domain) in self.domains.iter() {
            info!("[{}] {}: {}", family, domain, domain.update_status);
        }
        self.emit_event(EngineEvent::PassCompleted { succeeded, failed });

        &self.domains
    }

    /// Reconcile every domain of one address family
    pub async fn run(&mut self, family: AddressFamily) -> FamilyOutcome {
        let Some(ip) = self.desired_ip(family).await else {
            debug!("No {} address available, skipping family", family);
            self.emit_event(EngineEvent::FamilySkipped { family });
            return FamilyOutcome::Skipped;
        };

        let count = self.domains.for_family(family).len();
        let mut writes = 0;

        for index in 0..count {
            let domain = self.domains.for_family(family)[index].clone();

            let records = match self.provider.list_records(&domain, family).await {
                Ok(records) => records,
                Err(e) => {
                    let skipped = count - index - 1;
                    error!(
                        "Failed to list {} records of {}: {}. Skipping {} remaining domain(s)",
                        family, domain, e, skipped
                    );
                    self.emit_event(EngineEvent::QueryFailed {
                        family,
                        domain: domain.to_string(),
                        error: e.to_string(),
                        skipped,
                    });
                    return FamilyOutcome::Aborted {
                        domain: domain.to_string(),
                        error: e.to_string(),
                        skipped,
                    };
                }
            };

            let outcome = if records.is_empty() {
                self.create(&domain, family, ip).await
            } else {
                self.update(&domain, family, ip, &records).await
            };

            writes += outcome.writes;
            if let Some(status) = outcome.status {
                self.domains.for_family_mut(family)[index].update_status = status;
            }
        }

        FamilyOutcome::Completed { writes }
    }

    /// Run passes every `interval_secs` until the shutdown signal fires
    ///
    /// A pass in flight always finishes; shutdown is observed between passes.
    /// Dropping the sender counts as a shutdown signal.
    pub async fn run_with_shutdown(
        &mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        let interval = Duration::from_secs(self.interval_secs);
        info!(
            "Reconciling {} domain(s) every {:?} via {}",
            self.domains.len(),
            interval,
            self.provider.provider_name()
        );

        loop {
            self.reconcile_all().await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown_rx => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Desired IP for `family`, or None when the family should be skipped
    async fn desired_ip(&self, family: AddressFamily) -> Option<IpAddr> {
        match self.ip_source.current(family).await {
            Ok(Some(ip)) if family.matches(&ip) => Some(ip),
            Ok(Some(ip)) => {
                warn!(
                    "{} returned {} for {} records, skipping family",
                    self.ip_source.source_name(),
                    ip,
                    family
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(
                    "Failed to get {} address from {}: {}",
                    family,
                    self.ip_source.source_name(),
                    e
                );
                None
            }
        }
    }

    /// Create path: one write, status from its result
    async fn create(&self, domain: &Domain, family: AddressFamily, ip: IpAddr) -> WriteOutcome {
        debug!("No {} record for {}, creating one", family, domain);
        let result = self
            .provider
            .create_record(domain, family, ip, self.ttl)
            .await;

        let status = match classify(result) {
            Ok(_) => {
                info!("Created {} record {} successfully! IP: {}", family, domain, ip);
                self.emit_event(EngineEvent::RecordCreated {
                    family,
                    domain: domain.to_string(),
                    ip,
                });
                UpdateStatus::Success
            }
            Err(failure) => {
                warn!(
                    "Failed to create {} record {}! {}",
                    family, domain, failure.describe()
                );
                self.emit_event(failure.into_event(family, domain));
                UpdateStatus::Failed
            }
        };

        WriteOutcome {
            writes: 1,
            status: Some(status),
        }
    }

    /// Update path: one write per record whose value differs
    ///
    /// The domain's status reflects the last write made, in record order.
    async fn update(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        records: &[ExistingRecord],
    ) -> WriteOutcome {
        let mut outcome = WriteOutcome::default();

        for record in records {
            if record.points_to(&ip) {
                info!("Your IP {} has not changed, domain {}", ip, domain);
                self.emit_event(EngineEvent::RecordUnchanged {
                    family,
                    domain: domain.to_string(),
                    record_id: record.id.clone(),
                    ip,
                });
                continue;
            }

            debug!(
                "Updating {} record {} of {}: {} -> {}",
                family, record.id, domain, record.value, ip
            );
            let result = self
                .provider
                .update_record(domain, family, ip, record, self.ttl)
                .await;
            outcome.writes += 1;

            let status = match classify(result) {
                Ok(_) => {
                    info!("Updated {} record {} successfully! IP: {}", family, domain, ip);
                    self.emit_event(EngineEvent::RecordUpdated {
                        family,
                        domain: domain.to_string(),
                        record_id: record.id.clone(),
                        ip,
                    });
                    UpdateStatus::Success
                }
                Err(failure) => {
                    warn!(
                        "Failed to update {} record {}! {}",
                        family, domain, failure.describe()
                    );
                    self.emit_event(failure.into_event(family, domain));
                    UpdateStatus::Failed
                }
            };
            outcome.status = Some(status);
        }

        outcome
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        // Never block a pass on a slow consumer
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Writes issued for one domain and the status to record, if any
#[derive(Debug, Default)]
struct WriteOutcome {
    writes: usize,
    status: Option<UpdateStatus>,
}

/// Why a write did not succeed
enum WriteFailure {
    /// The provider answered with a non-success code
    Rejected(ProviderStatus),
    /// No usable answer
    Error(Error),
}

impl WriteFailure {
    fn describe(&self) -> String {
        match self {
            WriteFailure::Rejected(status) => status.to_string(),
            WriteFailure::Error(e) => format!("Error: {}", e),
        }
    }

    fn into_event(self, family: AddressFamily, domain: &Domain) -> EngineEvent {
        let (code, message) = match self {
            WriteFailure::Rejected(status) => (Some(status.code), status.message),
            WriteFailure::Error(e) => (None, e.to_string()),
        };
        EngineEvent::WriteFailed {
            family,
            domain: domain.to_string(),
            code,
            message,
        }
    }
}

/// Errors and non-success codes are the same class of failure for writes
fn classify(
    result: Result<ProviderStatus>,
) -> std::result::Result<ProviderStatus, WriteFailure> {
    match result {
        Ok(status) if status.is_success() => Ok(status),
        Ok(status) => Err(WriteFailure::Rejected(status)),
        Err(e) => Err(WriteFailure::Error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success_code() {
        let ok = classify(Ok(ProviderStatus::new("1", "ok")));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_classify_rejection_keeps_provider_message() {
        let rejected = classify(Ok(ProviderStatus::new("10", "denied")));
        let Err(failure) = rejected else {
            panic!("expected a rejection");
        };
        assert_eq!(failure.describe(), "Code: 10, Message: denied");

        let event = failure.into_event(AddressFamily::Ipv4, &Domain::new("example.com", "sub"));
        assert_eq!(
            event,
            EngineEvent::WriteFailed {
                family: AddressFamily::Ipv4,
                domain: "sub.example.com".to_string(),
                code: Some("10".to_string()),
                message: "denied".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_transport_error_has_no_code() {
        let failed = classify(Err(Error::transport("connection refused")));
        let Err(failure) = failed else {
            panic!("expected a failure");
        };
        let event = failure.into_event(AddressFamily::Ipv6, &Domain::new("example.com", ""));
        assert!(matches!(event, EngineEvent::WriteFailed { code: None, .. }));
    }
}
