// handlers/public.rs - GET /, GET /health and the envelope fallbacks

use axum::{
    extract::State,
    http::{Method, Uri},
};
use serde_json::{json, Value};

use crate::app::StoreBackend;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::{
    BlogPost, Contact, Product, Quote, ResourceDescriptor, Service, Testimonial,
};

/// GET / - service banner
pub async fn root() -> ApiResponse<Value> {
    let resources = [
        ResourceDescriptor::of::<Product>(),
        ResourceDescriptor::of::<Service>(),
        ResourceDescriptor::of::<Testimonial>(),
        ResourceDescriptor::of::<BlogPost>(),
        ResourceDescriptor::of::<Contact>(),
        ResourceDescriptor::of::<Quote>(),
    ];

    ApiResponse::success(json!({
        "name": "Back Office API",
        "version": env!("CARGO_PKG_VERSION"),
        "resources": resources,
        "endpoints": {
            "list": "GET /api/:resource",
            "create": "POST /api/:resource",
            "record": "GET|PUT|PATCH|DELETE /api/:resource/:id",
            "realtime": "GET /realtime (websocket)",
            "health": "GET /health",
        }
    }))
}

/// GET /health - liveness, plus a store ping when a database is configured
pub async fn health(State(backend): State<StoreBackend>) -> ApiResult<Value> {
    backend.ping().await.map_err(|e| {
        tracing::error!("Health check failed on {} store: {}", backend.name(), e);
        ApiError::service_unavailable(format!("{} store unavailable", backend.name()))
    })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "store": backend.name(),
    })))
}

/// Router fallback for paths no route matches
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

/// Method fallback on routes that exist but do not accept the verb
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::method_not_allowed(format!("{} is not allowed on {}", method, uri.path()))
}
