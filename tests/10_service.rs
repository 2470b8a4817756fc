mod common;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

#[tokio::test]
async fn banner_lists_resources() -> Result<()> {
    let (app, _) = common::app()?;
    let res = common::send(&app, Method::GET, "/", None, None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], json!(true));
    let names: Vec<&str> = res.body["data"]["resources"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(names, vec!["products", "services", "testimonials", "blog_posts", "contacts", "quotes"]);
    Ok(())
}

#[tokio::test]
async fn health_reports_memory_store() -> Result<()> {
    let (app, _) = common::app()?;
    let res = common::send(&app, Method::GET, "/health", None, None).await?;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], json!("ok"));
    assert_eq!(res.body["data"]["store"], json!("memory"));
    Ok(())
}

#[tokio::test]
async fn every_response_carries_a_request_id() -> Result<()> {
    let (app, _) = common::app()?;

    let generated = common::send(&app, Method::GET, "/api/products", None, None).await?;
    let id = generated.headers.get("x-request-id").expect("request id header");
    assert_eq!(id.len(), 8);

    let echoed = common::send_with(&app, Method::GET, "/health", None, None, &[("x-request-id", "trace-42")]).await?;
    assert_eq!(echoed.headers.get("x-request-id").unwrap(), "trace-42");
    Ok(())
}

#[tokio::test]
async fn malformed_json_gets_the_failure_envelope() -> Result<()> {
    let (app, _) = common::app()?;
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/contacts")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))?;

    let response = tower::ServiceExt::oneshot(app, request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn unrouted_requests_get_the_failure_envelope() -> Result<()> {
    let (app, _) = common::app()?;

    let wrong_method = common::send(&app, Method::POST, "/api/products/1", None, None).await?;
    assert_eq!(wrong_method.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(wrong_method.body["success"], json!(false));
    assert!(wrong_method.body["error"].as_str().unwrap().contains("POST"));

    let bad_id = common::send(&app, Method::GET, "/api/products/%FF", None, None).await?;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["success"], json!(false));
    assert!(bad_id.body["error"].as_str().unwrap().starts_with("Invalid id"));

    let unknown = common::send(&app, Method::GET, "/api/nope", None, None).await?;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body, json!({ "success": false, "error": "No route for /api/nope" }));

    let banner_delete = common::send(&app, Method::DELETE, "/", None, None).await?;
    assert_eq!(banner_delete.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(banner_delete.body["success"], json!(false));
    Ok(())
}

/// Marks spans that carry a `request_id` field
struct Correlated;

/// Records every event's target and whether it ran under a correlated span
#[derive(Clone, Default)]
struct CorrelationRecorder {
    events: Arc<Mutex<Vec<(String, bool)>>>,
}

impl<S> Layer<S> for CorrelationRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        if attrs.metadata().fields().field("request_id").is_some() {
            if let Some(span) = ctx.span(id) {
                span.extensions_mut().insert(Correlated);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let correlated = ctx
            .event_scope(event)
            .map(|mut scope| scope.any(|span| span.extensions().get::<Correlated>().is_some()))
            .unwrap_or(false);
        self.events
            .lock()
            .unwrap()
            .push((event.metadata().target().to_string(), correlated));
    }
}

#[tokio::test]
async fn http_trace_events_carry_the_request_id() -> Result<()> {
    let (app, _) = common::app()?;
    let recorder = CorrelationRecorder::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(recorder.clone()));

    let res = common::send(&app, Method::GET, "/api/products", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);

    let events = recorder.events.lock().unwrap();
    let http_events: Vec<_> = events
        .iter()
        .filter(|(target, _)| target.starts_with("tower_http::trace"))
        .collect();
    assert!(!http_events.is_empty(), "no tower_http trace events in {events:?}");
    assert!(http_events.iter().all(|(_, correlated)| *correlated), "{http_events:?}");
    Ok(())
}
