use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use super::ResourceState;
use crate::crud::CrudError;
use crate::database::Record;
use crate::error::ApiError;
use crate::filter::QuerySpec;
use crate::middleware::{listener_id, ApiResponse, ApiResult};
use crate::resources::Resource;
use crate::types::Operation;

/// GET /api/:resource - paginated, filtered, newest first
pub async fn list<R: Resource>(
    State(state): State<ResourceState<R>>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Vec<Record>> {
    state.authorize(Operation::List, &headers).await?;

    let Query(params) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    tracing::debug!(?params, "{} list parameters", R::NAME);
    let spec = QuerySpec::from_params(params, &state.ctx.query).map_err(CrudError::from)?;

    let page = state.engine.list(&spec).await?;
    Ok(page.into())
}

/// POST /api/:resource - create one record
pub async fn create<R: Resource>(
    State(state): State<ResourceState<R>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Record> {
    state.authorize(Operation::Create, &headers).await?;

    let Json(body) = body?;
    let record = state.engine.create(body).await?;

    state.ctx.bus.publish(R::TOPIC, listener_id(&headers));
    Ok(ApiResponse::created(record))
}
