//! Contract Test: Idempotency & No-op Conditions
//!
//! Constraints verified:
//! - An unchanged IP produces zero writes on the next pass
//! - An empty desired IP produces zero provider calls for that family
//! - A pass without writes leaves statuses from the previous pass
//!
//! If this test fails, the engine is issuing spurious provider requests.

mod common;

use common::*;
use ddns_core::{AddressFamily, DdnsEngine, EngineEvent, FamilyOutcome, UpdateStatus};

#[tokio::test]
async fn second_pass_with_same_ip_writes_nothing() {
    let provider = ScriptedProvider::new();
    let (mut engine, _rx) = DdnsEngine::new(
        Box::new(StaticIpSource::new(Some("1.2.3.4"), None)),
        Box::new(ScriptedProvider::sharing_state_with(&provider)),
        &config_for(&["sub.example.com"], &[]),
    )
    .expect("engine construction succeeds");

    // First pass creates the record
    engine.reconcile_all().await;
    assert_eq!(provider.write_calls().len(), 1);

    // The provider now holds the record
    provider.set_records(
        "sub.example.com",
        AddressFamily::Ipv4,
        vec![record("42", "1.2.3.4")],
    );
    provider.clear_calls();

    engine.reconcile_all().await;

    assert!(provider.write_calls().is_empty());
    assert_eq!(provider.calls().len(), 1, "only the list call is expected");
    assert_eq!(engine.domains().ipv4[0].update_status, UpdateStatus::Success);
}

#[tokio::test]
async fn empty_desired_ip_makes_no_calls() {
    let provider = ScriptedProvider::new();
    let source = StaticIpSource::new(None, None);
    let (mut engine, mut rx) = DdnsEngine::new(
        Box::new(source.clone()),
        Box::new(ScriptedProvider::sharing_state_with(&provider)),
        &config_for(&["a.example.com", "b.example.com"], &["a.example.com"]),
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run(AddressFamily::Ipv4).await, FamilyOutcome::Skipped);
    assert_eq!(engine.run(AddressFamily::Ipv6).await, FamilyOutcome::Skipped);

    assert!(provider.calls().is_empty());
    assert_eq!(source.call_count(), 2);
    assert!(engine
        .domains()
        .iter()
        .all(|(_, d)| d.update_status == UpdateStatus::Unset));
    assert_eq!(
        rx.try_recv().ok(),
        Some(EngineEvent::FamilySkipped {
            family: AddressFamily::Ipv4
        })
    );
}

#[tokio::test]
async fn failing_ip_source_is_treated_as_empty() {
    let provider = ScriptedProvider::new();
    let (mut engine, _rx) = DdnsEngine::new(
        Box::new(StaticIpSource::failing()),
        Box::new(ScriptedProvider::sharing_state_with(&provider)),
        &config_for(&["a.example.com"], &[]),
    )
    .expect("engine construction succeeds");

    engine.reconcile_all().await;

    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn address_of_wrong_family_is_ignored() {
    let provider = ScriptedProvider::new();
    // The IPv4 slot answers with an IPv6 address
    let (mut engine, _rx) = DdnsEngine::new(
        Box::new(StaticIpSource::new(Some("2001:db8::1"), None)),
        Box::new(ScriptedProvider::sharing_state_with(&provider)),
        &config_for(&["a.example.com"], &[]),
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run(AddressFamily::Ipv4).await, FamilyOutcome::Skipped);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn ipv6_only_host_skips_ipv4() {
    let provider = ScriptedProvider::new();
    let (mut engine, _rx) = DdnsEngine::new(
        Box::new(StaticIpSource::new(None, Some("2001:db8::1"))),
        Box::new(ScriptedProvider::sharing_state_with(&provider)),
        &config_for(&["a.example.com"], &["b.example.com"]),
    )
    .expect("engine construction succeeds");

    let domains = engine.reconcile_all().await;

    assert_eq!(domains.ipv4[0].update_status, UpdateStatus::Unset);
    assert_eq!(domains.ipv6[0].update_status, UpdateStatus::Success);
    assert!(provider
        .calls()
        .iter()
        .all(|call| !matches!(
            call,
            ProviderCall::List { family: AddressFamily::Ipv4, .. }
                | ProviderCall::Create { family: AddressFamily::Ipv4, .. }
        )));
}

#[tokio::test]
async fn failed_status_survives_a_no_write_pass() {
    let provider = ScriptedProvider::new()
        .with_records("sub.example.com", AddressFamily::Ipv4, vec![record("42", "9.9.9.9")])
        .then_write("10", "denied");
    let (mut engine, _rx) = DdnsEngine::new(
        Box::new(StaticIpSource::new(Some("1.2.3.4"), None)),
        Box::new(ScriptedProvider::sharing_state_with(&provider)),
        &config_for(&["sub.example.com"], &[]),
    )
    .expect("engine construction succeeds");

    engine.reconcile_all().await;
    assert_eq!(engine.domains().ipv4[0].update_status, UpdateStatus::Failed);

    // Someone fixed the record by hand; the next pass has nothing to write
    provider.set_records(
        "sub.example.com",
        AddressFamily::Ipv4,
        vec![record("42", "1.2.3.4")],
    );
    engine.reconcile_all().await;

    assert_eq!(engine.domains().ipv4[0].update_status, UpdateStatus::Failed);
}
