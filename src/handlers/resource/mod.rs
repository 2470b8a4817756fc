pub mod collection;
pub mod record;

use axum::{http::HeaderMap, routing::get, Router};
use std::sync::Arc;
use tracing::debug;

use crate::app::{AppContext, DynStore};
use crate::auth::Subject;
use crate::crud::CrudEngine;
use crate::error::ApiError;
use crate::handlers::public::method_not_allowed;
use crate::middleware::{require_admin, requires_admin};
use crate::resources::Resource;
use crate::types::Operation;

/// Per-resource handler state: the engine bound to this resource's store plus
/// the shared services
pub struct ResourceState<R: Resource> {
    pub engine: Arc<CrudEngine<R, DynStore<R>>>,
    pub ctx: AppContext,
}

impl<R: Resource> Clone for ResourceState<R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            ctx: self.ctx.clone(),
        }
    }
}

impl<R: Resource> ResourceState<R> {
    pub fn new(store: DynStore<R>, ctx: AppContext) -> Self {
        Self {
            engine: Arc::new(CrudEngine::new(store)),
            ctx,
        }
    }

    /// Admin check for operations the resource's access policy does not open
    /// to the public. `None` means the call was public.
    pub async fn authorize(&self, operation: Operation, headers: &HeaderMap) -> Result<Option<Subject>, ApiError> {
        if !requires_admin(R::ACCESS, operation) {
            debug!("{} {:?} is public", R::NAME, operation);
            return Ok(None);
        }
        require_admin(&self.ctx.resolver, headers).await.map(Some)
    }
}

/// `/api/<name>` and `/api/<name>/:id` for resource `R`
pub fn resource_routes<R: Resource>(state: ResourceState<R>) -> Router {
    Router::new()
        .route(
            &format!("/api/{}", R::NAME),
            get(collection::list::<R>)
                .post(collection::create::<R>)
                .fallback(method_not_allowed),
        )
        .route(
            &format!("/api/{}/:id", R::NAME),
            get(record::get::<R>)
                .put(record::update::<R>)
                .patch(record::update::<R>)
                .delete(record::delete::<R>)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}
