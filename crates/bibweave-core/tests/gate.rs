//! Request gate behavior against a local mock HTTP server.
//!
//! The gate is synchronous (workers are plain threads), so the mock server
//! is driven on the shared runtime and the gate is called directly.

use std::future::Future;

use bibweave_core::{GateConfig, GateError, GateRequest, RequestGate, SHARED_RUNTIME};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn block_on<F: Future>(fut: F) -> F::Output {
    SHARED_RUNTIME.handle().block_on(fut)
}

/// Gate with no backoff sleeps so retry tests run instantly.
fn fast_gate(cache_dir: &TempDir) -> RequestGate {
    RequestGate::new(
        GateConfig {
            max_retries: 3,
            backoff_factor: 0.0,
        },
        cache_dir.path(),
    )
    .unwrap()
}

#[test]
fn cached_fetch_issues_no_second_network_call() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/works/doi:10.1/x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "t"})))
            .expect(1)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let req = GateRequest::get(format!("{}/works/doi:10.1/x", server.uri()));

    let first = gate.execute(&req).unwrap();
    let second = gate.execute(&req).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["title"], "t");
    // expect(1) verifies on server drop that only one request arrived
}

#[test]
fn not_found_short_circuits_with_zero_retries() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let err = gate
        .execute(&GateRequest::get(format!("{}/missing", server.uri())))
        .unwrap_err();
    assert!(matches!(err, GateError::NotFound));
}

#[test]
fn not_found_is_not_cached() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server),
    );
    block_on(
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let req = GateRequest::get(format!("{}/flaky", server.uri()));
    assert!(gate.execute(&req).unwrap_err().is_not_found());
    // The record appeared later; the earlier 404 must not mask it.
    assert_eq!(gate.execute(&req).unwrap()["ok"], json!(true));
}

#[test]
fn transient_failures_then_success_yields_payload() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/shaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server),
    );
    block_on(
        Mock::given(method("GET"))
            .and(path("/shaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 1})))
            .expect(1)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let value = gate
        .execute(&GateRequest::get(format!("{}/shaky", server.uri())))
        .unwrap();
    assert_eq!(value["v"], 1);
}

#[test]
fn exhaustion_yields_failure_not_not_found() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(4) // initial attempt + 3 retries
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let err = gate
        .execute(&GateRequest::get(format!("{}/down", server.uri())))
        .unwrap_err();
    match err {
        GateError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 4);
            assert!(last.contains("503"), "last error was: {last}");
        }
        GateError::NotFound => panic!("exhaustion must not look like absence"),
    }
}

#[test]
fn rate_limited_then_success() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server),
    );
    block_on(
        Mock::given(method("GET"))
            .and(path("/throttled"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 2})))
            .expect(1)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let value = gate
        .execute(&GateRequest::get(format!("{}/throttled", server.uri())))
        .unwrap();
    assert_eq!(value["v"], 2);
}

#[test]
fn post_responses_are_not_cached() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("POST"))
            .and(path("/batch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(2)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let req = GateRequest::post(format!("{}/batch", server.uri()), json!({"ids": ["a"]}));
    gate.execute(&req).unwrap();
    gate.execute(&req).unwrap();
    // expect(2): both calls hit the network
}

#[test]
fn malformed_json_is_retried_then_fails() {
    let server = block_on(MockServer::start());
    block_on(
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .expect(4)
            .mount(&server),
    );

    let dir = TempDir::new().unwrap();
    let gate = fast_gate(&dir);
    let err = gate
        .execute(&GateRequest::get(format!("{}/garbage", server.uri())))
        .unwrap_err();
    assert!(matches!(err, GateError::Exhausted { .. }));
}
