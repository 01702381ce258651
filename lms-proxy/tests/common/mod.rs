#![allow(dead_code)]
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, Response, header},
};
use lms_proxy::{
    app,
    config::{AppState, EnvVars, Environment},
    lms::LmsClient,
    store::Store,
};
use serde_json::Value;

pub const TOKEN: &str = "test-token";

pub fn env_vars(lms_base_url: &str) -> EnvVars {
    EnvVars {
        environment: Environment::Development,
        port: 0,
        lms_base_url: lms_base_url.to_string(),
        lms_token: TOKEN.to_string(),
        allowed_origins: vec![],
        request_body_size_limit: 1024 * 1024,
        request_timeout_in_ms: 5_000,
        upstream_timeout_in_ms: 2_000,
        sentry_dsn: None,
    }
}

pub fn app(lms_base_url: &str) -> Router {
    let env_vars = env_vars(lms_base_url);
    let lms = LmsClient::new(
        &env_vars.lms_base_url,
        &env_vars.lms_token,
        Duration::from_millis(env_vars.upstream_timeout_in_ms),
    )
    .unwrap();
    app::router(AppState {
        lms,
        store: Arc::new(Store::new()),
        env_vars,
    })
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
