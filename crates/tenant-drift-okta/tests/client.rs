// crates/tenant-drift-okta/tests/client.rs
// ============================================================================
// Module: Okta Client Tests
// Description: Exercises pagination, limits, and error classification.
// Purpose: Verify the HTTP collection source against local servers.
// ============================================================================

//! ## Overview
//! Each test runs a `tiny_http` server on an ephemeral loopback port and
//! points an [`OktaHttpSource`] at it with cleartext HTTP allowed.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tenant_drift_core::CollectionSource;
use tenant_drift_core::FetchError;
use tenant_drift_core::ResourcePath;
use tenant_drift_okta::OktaClientConfig;
use tenant_drift_okta::OktaEnvironment;
use tenant_drift_okta::OktaHttpSource;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Canned reply for one request.
struct Reply {
    status: u16,
    body: String,
    link: Option<String>,
}

impl Reply {
    fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            link: None,
        }
    }

    fn with_link(mut self, link: String) -> Self {
        self.link = Some(link);
        self
    }
}

/// Observed request line and authorization header.
struct Seen {
    url: String,
    authorization: Option<String>,
}

/// Starts a server answering with `route(base, url)`; returns the base URL.
fn serve<F>(route: F) -> (String, mpsc::Receiver<Seen>)
where
    F: Fn(&str, &str) -> Reply + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let base = format!("http://{addr}");
    let (tx, rx) = mpsc::channel();
    let thread_base = base.clone();
    thread::spawn(move || {
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_secs(5)) {
            let authorization = request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Authorization"))
                .map(|header| header.value.to_string());
            let url = request.url().to_string();
            let reply = route(&thread_base, &url);
            let _ = tx.send(Seen {
                url,
                authorization,
            });
            let mut response = Response::from_string(reply.body).with_status_code(reply.status);
            if let Some(link) = reply.link {
                response = response.with_header(Header::from_bytes(&b"Link"[..], link.as_bytes()).unwrap());
            }
            let _ = request.respond(response);
        }
    });
    (base, rx)
}

fn source(base: &str, config: OktaClientConfig) -> OktaHttpSource {
    OktaHttpSource::new(
        &OktaEnvironment {
            domain: base.to_string(),
            token: "secret-token".to_string(),
        },
        OktaClientConfig {
            allow_http: true,
            ..config
        },
    )
    .unwrap()
}

// ============================================================================
// SECTION: Pagination
// ============================================================================

#[test]
fn follows_next_links_and_sends_ssws_token() {
    let (base, seen) = serve(|base, url| {
        if url.contains("after=00g1") {
            Reply::ok(r#"[{"id": "00g2"}]"#)
        } else {
            Reply::ok(r#"[{"id": "00g1"}]"#)
                .with_link(format!("<{base}/api/v1/groups?after=00g1&limit=200>; rel=\"next\""))
        }
    });
    let source = source(&base, OktaClientConfig::default());
    let records = source.fetch_collection(&ResourcePath::org("/api/v1/groups")).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["id"], "00g2");

    let first = seen.recv().unwrap();
    assert_eq!(first.url, "/api/v1/groups?limit=200");
    assert_eq!(first.authorization.as_deref(), Some("SSWS secret-token"));
    assert!(seen.recv().unwrap().url.contains("after=00g1"));
}

#[test]
fn explicit_limit_and_query_are_preserved() {
    let (base, seen) = serve(|_, _| Reply::ok("[]"));
    let source = source(&base, OktaClientConfig::default());
    let records =
        source.fetch_collection(&ResourcePath::org("/api/v1/policies?type=PASSWORD&limit=50")).unwrap();
    assert!(records.is_empty());
    assert_eq!(seen.recv().unwrap().url, "/api/v1/policies?type=PASSWORD&limit=50");
}

#[test]
fn page_count_is_bounded() {
    let (base, _seen) = serve(|base, _| {
        Reply::ok("[{}]").with_link(format!("<{base}/api/v1/groups?after=x>; rel=\"next\""))
    });
    let source = source(
        &base,
        OktaClientConfig {
            max_pages: 3,
            ..OktaClientConfig::default()
        },
    );
    let err = source.fetch_collection(&ResourcePath::org("/api/v1/groups")).unwrap_err();
    assert!(matches!(err, FetchError::LimitExceeded(_)), "{err}");
}

#[test]
fn off_origin_links_are_rejected() {
    let (base, _seen) = serve(|_, _| {
        Reply::ok("[]").with_link("<https://evil.example/api/v1/groups>; rel=\"next\"".to_string())
    });
    let err = source(&base, OktaClientConfig::default())
        .fetch_collection(&ResourcePath::org("/api/v1/groups"))
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{err}");
}

#[test]
fn list_key_unwraps_object_payloads() {
    let (base, _seen) = serve(|_, _| Reply::ok(r#"{"roles": [{"label": "Helpdesk"}]}"#));
    let records = source(&base, OktaClientConfig::default())
        .fetch_collection(&ResourcePath::org("/api/v1/iam/roles").with_list_key("roles"))
        .unwrap();
    assert_eq!(records[0]["label"], "Helpdesk");
}

#[test]
fn sub_collections_substitute_the_parent_id() {
    let (base, seen) = serve(|_, _| Reply::ok("[]"));
    let source = source(&base, OktaClientConfig::default());
    source
        .fetch_sub_collection(&ResourcePath::org("/api/v1/policies/{parent}/rules"), "00p1")
        .unwrap();
    assert_eq!(seen.recv().unwrap().url, "/api/v1/policies/00p1/rules?limit=200");
    let err = source
        .fetch_sub_collection(&ResourcePath::org("/api/v1/policies/{parent}/rules"), "../admin")
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidRequest(_)));
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

#[test]
fn server_errors_are_status_failures() {
    let (base, _seen) = serve(|_, _| Reply {
        status: 500,
        body: "{}".to_string(),
        link: None,
    });
    let err = source(&base, OktaClientConfig::default())
        .fetch_collection(&ResourcePath::org("/api/v1/groups"))
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[test]
fn invalid_json_is_malformed() {
    let (base, _seen) = serve(|_, _| Reply::ok("<html>"));
    let err = source(&base, OktaClientConfig::default())
        .fetch_detail(&ResourcePath::org("/api/v1/org"))
        .unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)), "{err}");
}

#[test]
fn oversized_responses_are_rejected() {
    let (base, _seen) = serve(|_, _| Reply::ok(&format!("[\"{}\"]", "x".repeat(256))));
    let err = source(
        &base,
        OktaClientConfig {
            max_response_bytes: 64,
            ..OktaClientConfig::default()
        },
    )
    .fetch_collection(&ResourcePath::org("/api/v1/groups"))
    .unwrap_err();
    assert!(matches!(err, FetchError::LimitExceeded(_)), "{err}");
}

#[test]
fn slow_servers_time_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            thread::sleep(Duration::from_millis(1_500));
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n[]");
        }
    });
    let err = source(
        &format!("http://{addr}"),
        OktaClientConfig {
            timeout_ms: 200,
            ..OktaClientConfig::default()
        },
    )
    .fetch_collection(&ResourcePath::org("/api/v1/groups"))
    .unwrap_err();
    assert!(err.is_timeout(), "{err}");
}

#[test]
fn cleartext_origins_require_opt_in() {
    let result = OktaHttpSource::new(
        &OktaEnvironment {
            domain: "http://127.0.0.1:1".to_string(),
            token: "t".to_string(),
        },
        OktaClientConfig::default(),
    );
    assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    let debug = format!(
        "{:?}",
        OktaEnvironment {
            domain: "acme.okta.com".to_string(),
            token: "secret".to_string(),
        }
    );
    assert!(!debug.contains("secret"));
}
