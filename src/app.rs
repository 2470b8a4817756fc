// Application assembly: store backend, shared services and the router.

use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::{
    AuthorizationResolver, IdentityVerifier, JwtVerifier, MemoryDirectory, PgDirectory, RemoteVerifier,
    UserDirectory,
};
use crate::config::{AppConfig, QueryConfig, VerifierMode};
use crate::database::{DatabaseManager, MemoryStore, PgStore, ResourceStore, StoreError};
use crate::handlers::{self, resource_routes, ResourceState};
use crate::middleware::{failure_body, request_id_middleware};
use crate::realtime::{realtime_handler, InvalidationBus, SocketHub};
use crate::resources::{BlogPost, Contact, Product, Quote, Resource, Service, Testimonial};

/// Store handle as the handlers see it; Postgres or memory is chosen at startup
pub type DynStore<R> = Arc<dyn ResourceStore<R>>;

/// Where resource rows live
#[derive(Clone)]
pub enum StoreBackend {
    Memory,
    Postgres(DatabaseManager),
}

impl StoreBackend {
    pub fn store<R: Resource>(&self) -> DynStore<R> {
        match self {
            StoreBackend::Memory => Arc::new(MemoryStore::<R>::new()),
            StoreBackend::Postgres(db) => Arc::new(PgStore::<R>::new(db.pool())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres(_) => "postgres",
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            StoreBackend::Memory => Ok(()),
            StoreBackend::Postgres(db) => db.health_check().await,
        }
    }
}

/// Services shared by every resource router
#[derive(Clone)]
pub struct AppContext {
    pub resolver: Arc<AuthorizationResolver>,
    pub bus: Arc<InvalidationBus>,
    pub query: QueryConfig,
}

impl AppContext {
    /// Build the identity verifier and user directory the configuration asks for
    pub fn from_config(config: &AppConfig, backend: &StoreBackend) -> anyhow::Result<Self> {
        let verifier: Arc<dyn IdentityVerifier> = match config.auth.verifier {
            VerifierMode::Jwt => Arc::new(JwtVerifier::new(&config.auth.jwt_secret)?),
            VerifierMode::Remote => {
                let url = config
                    .auth
                    .remote_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("AUTH_REMOTE_URL is required for the remote verifier"))?;
                Arc::new(RemoteVerifier::new(
                    url,
                    config.auth.remote_api_key.clone(),
                    Duration::from_secs(config.database.connection_timeout),
                )?)
            }
        };

        let directory: Arc<dyn UserDirectory> = match backend {
            StoreBackend::Postgres(db) => Arc::new(PgDirectory::new(db.pool(), &config.auth.directory_table)?),
            StoreBackend::Memory => {
                warn!("No database configured, user directory is empty");
                Arc::new(MemoryDirectory::new())
            }
        };

        let resolver = AuthorizationResolver::new(verifier, directory).with_development(config.is_development());

        Ok(Self {
            resolver: Arc::new(resolver),
            bus: Arc::new(InvalidationBus::new()),
            query: config.query.clone(),
        })
    }
}

/// Connect to Postgres when a URL is configured, otherwise run on memory stores
pub async fn connect_backend(config: &AppConfig) -> anyhow::Result<StoreBackend> {
    if config.database.url.is_none() {
        warn!("DATABASE_URL not set, using in-memory stores (data is lost on restart)");
        return Ok(StoreBackend::Memory);
    }
    let db = DatabaseManager::connect(&config.database).await?;
    Ok(StoreBackend::Postgres(db))
}

/// Full router: banner, health, the six resources and, when a hub is given,
/// the realtime endpoint bound to the bus.
pub fn build_router(ctx: AppContext, backend: &StoreBackend, hub: Option<Arc<SocketHub>>, cors_origins: &[String]) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::root).fallback(handlers::method_not_allowed))
        .route("/health", get(handlers::health).fallback(handlers::method_not_allowed))
        .with_state(backend.clone())
        .merge(resource_routes::<Product>(ResourceState::new(backend.store(), ctx.clone())))
        .merge(resource_routes::<Service>(ResourceState::new(backend.store(), ctx.clone())))
        .merge(resource_routes::<Testimonial>(ResourceState::new(backend.store(), ctx.clone())))
        .merge(resource_routes::<BlogPost>(ResourceState::new(backend.store(), ctx.clone())))
        .merge(resource_routes::<Contact>(ResourceState::new(backend.store(), ctx.clone())))
        .merge(resource_routes::<Quote>(ResourceState::new(backend.store(), ctx.clone())));

    match hub {
        Some(hub) => {
            if let Err(e) = ctx.bus.bind(hub.clone()) {
                warn!("{}", e);
            }
            let realtime = Router::new()
                .route("/realtime", get(realtime_handler).fallback(handlers::method_not_allowed))
                .with_state(hub);
            app = app.merge(realtime);
            info!("Realtime endpoint enabled at /realtime");
        }
        None => info!("Realtime disabled, change notifications are dropped"),
    }

    with_layers(app, cors_origins)
}

/// Envelope fallback plus global middleware, outermost last. The trace layer
/// sits inside the request id span so its events carry the correlation id.
pub fn with_layers(app: Router, cors_origins: &[String]) -> Router {
    app.fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(failure_body("An unexpected error occurred")),
    )
        .into_response()
}
