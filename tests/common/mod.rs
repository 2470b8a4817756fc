#![allow(dead_code)]

use std::sync::{Arc, Once};

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;

use backoffice_api::app::{build_router, with_layers, AppContext, StoreBackend};
use backoffice_api::auth::{generate_jwt, AuthorizationResolver, Claims, JwtVerifier, MemoryDirectory};
use backoffice_api::config::QueryConfig;
use backoffice_api::handlers::{resource_routes, ResourceState};
use backoffice_api::realtime::InvalidationBus;
use backoffice_api::resources::Resource;

pub const SECRET: &str = "integration-test-secret";

/// Email the test directory lists as an admin
pub const DIRECTORY_ADMIN: &str = "Director@Example.com";

static TRACING: Once = Once::new();

/// Test-writer subscriber so server logs show up for failing tests;
/// `RUST_LOG` widens it
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    });
}

pub fn context() -> Result<AppContext> {
    init_tracing();
    let verifier = JwtVerifier::new(SECRET)?;
    let directory = MemoryDirectory::new()
        .with_user(DIRECTORY_ADMIN, "admin")
        .with_user("viewer@example.com", "viewer");

    Ok(AppContext {
        resolver: Arc::new(AuthorizationResolver::new(Arc::new(verifier), Arc::new(directory))),
        bus: Arc::new(InvalidationBus::new()),
        query: QueryConfig { default_limit: 10, max_limit: 100 },
    })
}

/// Whole application over memory stores, realtime disabled
pub fn app() -> Result<(Router, AppContext)> {
    let ctx = context()?;
    let router = build_router(ctx.clone(), &StoreBackend::Memory, None, &[]);
    Ok((router, ctx))
}

/// Routes of a single resource over the given store
pub fn resource_app<R: Resource>(store: backoffice_api::app::DynStore<R>, ctx: AppContext) -> Router {
    with_layers(resource_routes::<R>(ResourceState::new(store, ctx)), &[])
}

pub fn token(sub: &str, email: Option<&str>, role: Option<&str>) -> String {
    let claims = Claims::new(sub.to_string(), email.map(str::to_string), role.map(str::to_string), 1);
    generate_jwt(&claims, SECRET).expect("token")
}

pub fn admin_token() -> String {
    token("admin-1", Some("admin@example.com"), Some("admin"))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Result<TestResponse> {
    send_with(app, method, uri, bearer, body, &[]).await
}

pub async fn send_with(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
    extra_headers: &[(&str, &str)],
) -> Result<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };

    Ok(TestResponse { status, headers, body })
}
