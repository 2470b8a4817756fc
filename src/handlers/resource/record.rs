use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::HeaderMap,
    Json,
};
use serde_json::Value;

use super::ResourceState;
use crate::crud::Deleted;
use crate::database::Record;
use crate::middleware::{listener_id, ApiResponse, ApiResult};
use crate::resources::Resource;
use crate::types::Operation;

/// GET /api/:resource/:id - show single record by id
pub async fn get<R: Resource>(
    State(state): State<ResourceState<R>>,
    id: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> ApiResult<Record> {
    state.authorize(Operation::Get, &headers).await?;
    let Path(id) = id?;
    let record = state.engine.get(&id).await?;
    Ok(ApiResponse::success(record))
}

/// PUT|PATCH /api/:resource/:id - merge the body into an existing record
pub async fn update<R: Resource>(
    State(state): State<ResourceState<R>>,
    id: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Record> {
    state.authorize(Operation::Update, &headers).await?;
    let Path(id) = id?;

    let Json(body) = body?;
    let record = state.engine.update(&id, body).await?;

    state.ctx.bus.publish(R::TOPIC, listener_id(&headers));
    Ok(ApiResponse::success(record))
}

/// DELETE /api/:resource/:id - returns a confirmation, not the record
pub async fn delete<R: Resource>(
    State(state): State<ResourceState<R>>,
    id: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> ApiResult<Deleted> {
    state.authorize(Operation::Delete, &headers).await?;
    let Path(id) = id?;

    let deleted = state.engine.delete(&id).await?;

    state.ctx.bus.publish(R::TOPIC, listener_id(&headers));
    Ok(ApiResponse::success(deleted))
}
