//! HTTP routes driven through `tower::ServiceExt::oneshot`.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use agentctl::domain::AgentctlConfig;
use agentctl::http::{AppState, router};
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::mocks::{FakeAgent, rule};

fn app(agent: &FakeAgent, dir: &TempDir) -> Router {
    router(Arc::new(AppState {
        controller: agent.controller(dir),
        config: AgentctlConfig::default(),
    }))
}

async fn call(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn health_is_ok() {
    let agent = FakeAgent::new();
    let dir = TempDir::new().expect("tempdir");
    let (status, _) = call(&app(&agent, &dir), Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn guidance_is_a_normal_response() {
    let agent = FakeAgent::new();
    let dir = TempDir::new().expect("tempdir");
    let app = app(&agent, &dir);

    let (status, body) = call(&app, Method::GET, "/listAllRules", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Please run activateAgent API first."));

    let (status, body) = call(&app, Method::GET, "/terminateAgent", "").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("No active instrumentation agent listener found"));
}

#[tokio::test]
async fn activate_uses_query_properties_in_order() {
    let agent = FakeAgent::new();
    agent.state().fail_primary = true;
    let dir = TempDir::new().expect("tempdir");
    let app = app(&agent, &dir);

    let (status, body) = call(
        &app,
        Method::GET,
        "/activateAgent?properties=b%3D1&properties=a%3D2",
        "",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("activated instrumentation agent"));

    let state = agent.state();
    let opts = &state.module_loads[0].2;
    assert!(opts.contains(",prop:b=1,prop:a=2"), "{opts}");
}

#[tokio::test]
async fn activate_decodes_form_encoded_properties() {
    let agent = FakeAgent::new();
    agent.state().fail_primary = true;
    let dir = TempDir::new().expect("tempdir");
    let app = app(&agent, &dir);

    let (status, _) = call(
        &app,
        Method::GET,
        "/activateAgent?properties=with+space&properties=&other=x&properties=p%2Cq",
        "",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let opts = agent.state().module_loads[0].2.clone();
    assert!(opts.contains(",prop:with space,prop:p,q"), "{opts}");
    assert!(!opts.contains("prop:,"), "{opts}");
    assert!(!opts.contains("prop:x"), "{opts}");
}

#[tokio::test]
async fn activate_without_properties_uses_defaults() {
    let agent = FakeAgent::new();
    agent.state().fail_primary = true;
    let dir = TempDir::new().expect("tempdir");
    let app = app(&agent, &dir);

    call(&app, Method::GET, "/activateAgent", "").await;
    let opts = agent.state().module_loads[0].2.clone();
    assert!(opts.contains(",prop:org.jboss.byteman.verbose"), "{opts}");
    assert!(opts.contains(",boot:"), "{opts}");
}

#[tokio::test]
async fn add_list_delete_over_http() {
    let agent = FakeAgent::new();
    let dir = TempDir::new().expect("tempdir");
    let app = app(&agent, &dir);
    call(&app, Method::GET, "/activateAgent", "").await;

    let (status, body) = call(&app, Method::POST, "/addRules", &rule("on_entry")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "install rule on_entry\n");

    let (_, listing) = call(&app, Method::GET, "/listAllRules", "").await;
    assert!(listing.contains("RULE on_entry"));

    let (status, body) = call(&app, Method::POST, "/deleteRules", "RULE on_entry\n").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "uninstall RULE on_entry\n");

    let (_, body) = call(&app, Method::GET, "/agentStatus", "").await;
    assert!(body.starts_with("agent attached"), "{body}");
}

#[tokio::test]
async fn channel_failure_is_a_server_error() {
    let agent = FakeAgent::new();
    let dir = TempDir::new().expect("tempdir");
    let app = app(&agent, &dir);
    call(&app, Method::GET, "/activateAgent", "").await;
    agent.state().fail_submit = true;

    let (status, body) = call(&app, Method::POST, "/addRules", &rule("x")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("connection reset by agent"), "{body}");
}

#[tokio::test]
async fn rule_ops_require_post() {
    let agent = FakeAgent::new();
    let dir = TempDir::new().expect("tempdir");
    let (status, _) = call(&app(&agent, &dir), Method::GET, "/addRules", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
