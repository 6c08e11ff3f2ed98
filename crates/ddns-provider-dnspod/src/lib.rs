// # DNSPod DNS Provider
//
// This crate provides the DNSPod provider implementation for the DDNS system.
//
// ## Implementation Status
//
// - ✅ One HTTP request per trait call (list, create or update)
// - ✅ Form-encoded POSTs, JSON responses (`format=json`)
// - ✅ 10 second timeout on record queries
// - ✅ Both A and AAAA record support
// - ✅ Multiple records per name (each updated by id)
// - ❌ NO retry logic (one attempt per record per pass)
// - ❌ NO decision about whether to write (owned by DdnsEngine)
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - The token secret NEVER appears in logs or Debug output
// - The provider fails fast if either half of the credential is empty
//
// ## API Reference
//
// - List records: POST `/Record.List`
// - Create record: POST `/Record.Create`
// - Modify record: POST `/Record.Modify`
//
// Every call authenticates with `login_token={id},{secret}` and answers with
// `{"status": {"code": "1", "message": "..."}, ...}` where code "1" means success.

mod response;

use async_trait::async_trait;
use ddns_core::config::{ProviderConfig, ProviderCredential, Ttl};
use ddns_core::traits::{AddressFamily, DnsProvider, ExistingRecord, ProviderStatus};
use ddns_core::{Domain, Error, Result};
use std::net::IpAddr;
use std::time::Duration;

use response::{RecordListEnvelope, StatusEnvelope, decode_response};

/// DNSPod API base URL
const DNSPOD_API_BASE: &str = "https://dnsapi.cn";

/// Timeout for record queries
const LIST_TIMEOUT: Duration = Duration::from_secs(10);

/// The provider's name for its default resolution line
const DEFAULT_RECORD_LINE: &str = "默认";

/// Every request asks for JSON responses
const RESPONSE_FORMAT: &str = "json";

/// DNSPod API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    RecordList,
    RecordCreate,
    RecordModify,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::RecordList => "Record.List",
            Endpoint::RecordCreate => "Record.Create",
            Endpoint::RecordModify => "Record.Modify",
        }
    }
}

/// DNSPod DNS provider
///
/// Stateless apart from the immutable credential and HTTP client.
pub struct DnspodProvider {
    /// Sent as `login_token` with every request
    /// ⚠️ NEVER log the secret
    credential: ProviderCredential,

    /// Base URL, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the secret
impl std::fmt::Debug for DnspodProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnspodProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DnspodProvider {
    /// Create a new DNSPod provider against the public API
    pub fn new(credential: ProviderCredential) -> Result<Self> {
        Self::with_base_url(credential, DNSPOD_API_BASE)
    }

    /// Create a provider that talks to `base_url` instead of the public API
    pub fn with_base_url(credential: ProviderCredential, base_url: impl Into<String>) -> Result<Self> {
        credential.validate()?;

        // DNSPod rejects requests without a User-Agent
        let client = reqwest::Client::builder()
            .user_agent(concat!("ddns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            credential,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Fields shared by every call: credential, domain, sub_domain, record_type, format
    fn base_form(&self, domain: &Domain, family: AddressFamily) -> Vec<(&'static str, String)> {
        vec![
            ("login_token", self.credential.login_token()),
            ("domain", domain.domain_name.clone()),
            ("sub_domain", domain.sub_domain().to_string()),
            ("record_type", family.record_type().to_string()),
            ("format", RESPONSE_FORMAT.to_string()),
        ]
    }

    /// Fields shared by create and update
    fn write_form(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        ttl: Ttl,
    ) -> Vec<(&'static str, String)> {
        let mut form = self.base_form(domain, family);
        form.push(("record_line", DEFAULT_RECORD_LINE.to_string()));
        form.push(("value", ip.to_string()));
        form.push(("ttl", ttl.to_string()));
        form
    }

    /// Shared request execution: one form-encoded POST, no retry
    async fn send(
        &self,
        endpoint: Endpoint,
        form: &[(&'static str, String)],
    ) -> Result<ProviderStatus> {
        let url = self.url(endpoint);
        let response = self.client.post(&url).form(form).send().await;
        let envelope: StatusEnvelope = decode_response(response, endpoint.path()).await?;
        Ok(envelope.status)
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    /// List existing records
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /Record.List
    /// login_token=..&domain=example.com&sub_domain=www&record_type=A&format=json
    /// ```
    ///
    /// A non-success status inside a decodable response is not an error:
    /// DNSPod answers "no records" with code "10" and no `records` field.
    async fn list_records(&self, domain: &Domain, family: AddressFamily) -> Result<Vec<ExistingRecord>> {
        let endpoint = Endpoint::RecordList;
        let form = self.base_form(domain, family);

        tracing::debug!("Listing {} records of {}", family, domain);
        let response = self
            .client
            .post(self.url(endpoint))
            .timeout(LIST_TIMEOUT)
            .form(&form)
            .send()
            .await;

        let envelope: RecordListEnvelope = decode_response(response, endpoint.path()).await?;
        if !envelope.status.is_success() {
            tracing::debug!("{} of {} answered {}", endpoint.path(), domain, envelope.status);
        }

        Ok(envelope.records.into_iter().map(Into::into).collect())
    }

    /// Create a record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /Record.Create
    /// ...&record_line=默认&value=1.2.3.4&ttl=600
    /// ```
    async fn create_record(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        ttl: Ttl,
    ) -> Result<ProviderStatus> {
        let form = self.write_form(domain, family, ip, ttl);
        self.send(Endpoint::RecordCreate, &form).await
    }

    /// Modify a record in place
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /Record.Modify
    /// ...&record_line=默认&record_id=42&value=1.2.3.4&ttl=600
    /// ```
    async fn update_record(
        &self,
        domain: &Domain,
        family: AddressFamily,
        ip: IpAddr,
        record: &ExistingRecord,
        ttl: Ttl,
    ) -> Result<ProviderStatus> {
        let mut form = self.write_form(domain, family, ip, ttl);
        form.push(("record_id", record.id.clone()));
        self.send(Endpoint::RecordModify, &form).await
    }

    fn provider_name(&self) -> &'static str {
        "dnspod"
    }
}

/// Build the provider described by `config`
pub fn from_config(config: &ProviderConfig) -> Result<DnspodProvider> {
    match config {
        ProviderConfig::Dnspod { credential } => DnspodProvider::new(credential.clone()),
    }
}
