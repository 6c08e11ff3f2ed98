//! DNSPod response envelopes and the shared decoding helper

use ddns_core::traits::{ExistingRecord, ProviderStatus};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Longest body excerpt quoted in error messages
const MAX_BODY_EXCERPT: usize = 256;

/// Envelope returned by every write call
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope {
    pub status: ProviderStatus,
}

/// Envelope returned by `Record.List`
///
/// DNSPod omits `records` entirely when the domain has none.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordListEnvelope {
    pub status: ProviderStatus,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

/// A record as it appears on the wire
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub enabled: String,
}

impl From<RawRecord> for ExistingRecord {
    fn from(raw: RawRecord) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            value: raw.value,
            enabled: raw.enabled != "0",
        }
    }
}

/// Ids and flags arrive as strings from most endpoints and as numbers from some
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(i64),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::Text(s) => s,
        Repr::Number(n) => n.to_string(),
    })
}

/// Decode a provider response into `T`
///
/// - transport failure (including timeouts) → [`Error::Transport`]
/// - non-2xx status → [`Error::HttpStatus`]
/// - body that does not match `T` → [`Error::Decode`]
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Result<reqwest::Response>,
    endpoint: &str,
) -> Result<T> {
    let response = response.map_err(|e| {
        if e.is_timeout() {
            Error::transport(format!("{} timed out: {}", endpoint, e))
        } else {
            Error::transport(format!("{} request failed: {}", endpoint, e))
        }
    })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::transport(format!("{} failed to read response: {}", endpoint, e)))?;

    if !status.is_success() {
        return Err(Error::http_status(format!(
            "{} returned {}: {}",
            endpoint,
            status,
            excerpt(&body)
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        Error::decode(format!(
            "{} returned an unexpected body: {}. Response: {}",
            endpoint,
            e,
            excerpt(&body)
        ))
    })
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => &body[..cut],
        None => body,
    }
}
