//! Test doubles and common utilities for reconciliation contract tests
//!
//! The provider double is scripted per (domain, family) and records every
//! call it receives, so tests can assert on exactly which requests a pass
//! issued and in what order.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, EngineConfig, ProviderConfig, ProviderCredential, Ttl};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{AddressFamily, DnsProvider, ExistingRecord, IpSource, ProviderStatus};
use ddns_core::Domain;
use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A call received by [`ScriptedProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    List {
        domain: String,
        family: AddressFamily,
    },
    Create {
        domain: String,
        family: AddressFamily,
        ip: IpAddr,
        ttl: u32,
    },
    Update {
        domain: String,
        family: AddressFamily,
        ip: IpAddr,
        record_id: String,
        ttl: u32,
    },
}

impl ProviderCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, ProviderCall::List { .. })
    }
}

/// What a scripted list call returns
#[derive(Debug, Clone)]
enum ListScript {
    Records(Vec<ExistingRecord>),
    TransportError,
}

#[derive(Default)]
struct Script {
    lists: HashMap<(String, AddressFamily), ListScript>,
    /// Write responses consumed in order; `None` means a transport error
    writes: VecDeque<Option<ProviderStatus>>,
    calls: Vec<ProviderCall>,
}

/// A DnsProvider whose answers are set up by the test
///
/// - Domains without a scripted list answer have no records.
/// - Writes answer from the queue, then default to success.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that shares its script and call log with `other`
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
        }
    }

    /// Make `list_records(domain, family)` return these records
    pub fn with_records(self, domain: &str, family: AddressFamily, records: Vec<ExistingRecord>) -> Self {
        self.script
            .lock()
            .unwrap()
            .lists
            .insert((domain.to_string(), family), ListScript::Records(records));
        self
    }

    /// Make `list_records(domain, family)` fail at the transport level
    pub fn with_list_error(self, domain: &str, family: AddressFamily) -> Self {
        self.script
            .lock()
            .unwrap()
            .lists
            .insert((domain.to_string(), family), ListScript::TransportError);
        self
    }

    /// Queue the response of the next write
    pub fn then_write(self, code: &str, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .writes
            .push_back(Some(ProviderStatus::new(code, message)));
        self
    }

    /// Queue a transport failure for the next write
    pub fn then_write_error(self) -> Self {
        self.script.lock().unwrap().writes.push_back(None);
        self
    }

    /// Replace the records a later pass will see
    pub fn set_records(&self, domain: &str, family: AddressFamily, records: Vec<ExistingRecord>) {
        self.script
            .lock()
            .unwrap()
            .lists
            .insert((domain.to_string(), family), ListScript::Records(records));
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn write_calls(&self) -> Vec<ProviderCall> {
        self.calls().into_iter().filter(|c| c.is_write()).collect()
    }

    pub fn clear_calls(&self) {
        self.script.lock().unwrap().calls.clear();
    }

    fn next_write(&self) -> Result<ProviderStatus> {
        match self.script.lock().unwrap().writes.pop_front() {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(Error::transport("connection reset by peer")),
            None => Ok(ProviderStatus::new("1", "Action completed successful")),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for ScriptedProvider {
    async fn list_records(&self, domain: &Domain, family: AddressFamily) -> Result<Vec<ExistingRecord>> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(ProviderCall::List {
            domain: domain.to_string(),
            family,
        });

        match script.lists.get(&(domain.to_string(), family)) {
            Some(ListScript::Records(records)) => Ok(records.clone()),
            Some(ListScript::TransportError) => Err(Error::transport("operation timed out")),
            None => Ok(Vec::new()),
        }
    }

    async fn create_record(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        ttl: Ttl,
    ) -> Result<ProviderStatus> {
        self.script.lock().unwrap().calls.push(ProviderCall::Create {
            domain: domain.to_string(),
            family,
            ip,
            ttl: ttl.as_secs(),
        });
        self.next_write()
    }

    async fn update_record(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        record: &ExistingRecord,
        ttl: Ttl,
    ) -> Result<ProviderStatus> {
        self.script.lock().unwrap().calls.push(ProviderCall::Update {
            domain: domain.to_string(),
            family,
            ip,
            record_id: record.id.clone(),
            ttl: ttl.as_secs(),
        });
        self.next_write()
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// An IpSource with fixed answers per family
#[derive(Clone)]
pub struct StaticIpSource {
    ipv4: Option<IpAddr>,
    ipv6: Option<IpAddr>,
    fail: bool,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ipv4: Option<&str>, ipv6: Option<&str>) -> Self {
        Self {
            ipv4: ipv4.map(|ip| ip.parse().unwrap()),
            ipv6: ipv6.map(|ip| ip.parse().unwrap()),
            fail: false,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every lookup fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(None, None)
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self, family: AddressFamily) -> Result<Option<IpAddr>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::ip_source("echo service unreachable"));
        }
        Ok(match family {
            AddressFamily::Ipv4 => self.ipv4,
            AddressFamily::Ipv6 => self.ipv6,
        })
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An existing record as the provider would list it
pub fn record(id: &str, value: &str) -> ExistingRecord {
    ExistingRecord {
        id: id.to_string(),
        name: "sub".to_string(),
        value: value.to_string(),
        enabled: true,
    }
}

/// Helper to create a config managing the given domains
pub fn config_for(ipv4: &[&str], ipv6: &[&str]) -> DdnsConfig {
    let mut config = DdnsConfig::new(ProviderConfig::Dnspod {
        credential: ProviderCredential::new("12345", "test-secret"),
    });
    config.ipv4.domains = ipv4.iter().map(|d| d.to_string()).collect();
    config.ipv6.enabled = !ipv6.is_empty();
    config.ipv6.domains = ipv6.iter().map(|d| d.to_string()).collect();
    config.engine = EngineConfig {
        interval_secs: 1,
        event_channel_capacity: 100,
    };
    config
}
