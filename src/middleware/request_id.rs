use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns a correlation id, runs the rest of the stack inside a span carrying
/// it, and echoes it back in `x-request-id`.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = extract_request_id(request.headers());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    async move {
        debug!(query = request.uri().query().unwrap_or(""), "Incoming request");
        let mut response = next.run(request).await;
        info!(status = response.status().as_u16(), "Request completed");

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
        }
        response
    }
    .instrument(span)
    .await
}

fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .and_then(sanitize_request_id)
        .unwrap_or_else(short_id)
}

/// Eight hex characters, enough to tell concurrent requests apart in a log stream
fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn sanitize_request_id(raw: &str) -> Option<String> {
    const MAX_LEN: usize = 64;
    let id: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        .take(MAX_LEN)
        .collect();
    (!id.is_empty()).then_some(id)
}
