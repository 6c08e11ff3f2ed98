//! Contract Test: echo-service lookups
//!
//! Constraints verified:
//! - Each family queries its own URL with a plain GET
//! - A body without an address of the family is an error, not a guess
//! - HTTP failures surface as IpSource errors

use ddns_core::traits::{AddressFamily, IpSource};
use ddns_ip_http::HttpIpSource;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn echo(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn each_family_uses_its_own_url() {
    let server = MockServer::start().await;
    echo(&server, "/v4", 200, "1.2.3.4\n").await;
    echo(&server, "/v6", 200, "2001:db8::1\n").await;

    let source = HttpIpSource::new(
        Some(format!("{}/v4", server.uri())),
        Some(format!("{}/v6", server.uri())),
    )
    .unwrap();

    assert_eq!(
        source.current(AddressFamily::Ipv4).await.unwrap(),
        Some("1.2.3.4".parse().unwrap())
    );
    assert_eq!(
        source.current(AddressFamily::Ipv6).await.unwrap(),
        Some("2001:db8::1".parse().unwrap())
    );
}

#[tokio::test]
async fn disabled_family_makes_no_request() {
    let server = MockServer::start().await;
    echo(&server, "/v4", 200, "1.2.3.4").await;

    let source = HttpIpSource::new(Some(format!("{}/v4", server.uri())), None).unwrap();

    assert_eq!(source.current(AddressFamily::Ipv6).await.unwrap(), None);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn wrong_family_body_is_an_error() {
    let server = MockServer::start().await;
    // A dual-stack echo service answering over IPv6
    echo(&server, "/v4", 200, "2001:db8::1").await;

    let source = HttpIpSource::new(Some(format!("{}/v4", server.uri())), None).unwrap();
    let err = source.current(AddressFamily::Ipv4).await.unwrap_err();

    assert!(err.to_string().contains("2001:db8::1"));
}

#[tokio::test]
async fn server_error_is_an_error() {
    let server = MockServer::start().await;
    echo(&server, "/v4", 503, "try later").await;

    let source = HttpIpSource::new(Some(format!("{}/v4", server.uri())), None).unwrap();
    let err = source.current(AddressFamily::Ipv4).await.unwrap_err();

    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn lookups_are_not_cached() {
    let server = MockServer::start().await;
    echo(&server, "/v4", 200, "1.2.3.4").await;

    let source = HttpIpSource::new(Some(format!("{}/v4", server.uri())), None).unwrap();
    source.current(AddressFamily::Ipv4).await.unwrap();
    source.current(AddressFamily::Ipv4).await.unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
