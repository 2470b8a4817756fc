use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::database::record::{Payload, Record};
use crate::filter::{Filters, SearchSpec, SortDirection};
use crate::resources::Resource;

/// Failure reported by a store adapter. `message` is the adapter's own text;
/// `code` and `hint` are native diagnostics kept for logs and `details`.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("{message}")]
    Backend {
        message: String,
        code: Option<String>,
        hint: Option<String>,
    },

    #[error("Malformed row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend { message: message.into(), code: None, hint: None }
    }

    /// Adapter diagnostic exposed to callers as `details`
    pub fn diagnostic(&self) -> Value {
        match self {
            StoreError::Backend { message, code, hint } => json!({
                "message": message,
                "code": code,
                "hint": hint,
            }),
            other => json!({ "message": other.to_string() }),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) => {
                let hint = db_err
                    .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                    .and_then(|pg| pg.hint().map(str::to_string));
                StoreError::Backend {
                    message: db_err.message().to_string(),
                    code: db_err.code().map(|c| c.into_owned()),
                    hint,
                }
            }
            None => StoreError::backend(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Row predicate shared by the count and the data fetch of a List call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub filters: Filters,
    pub search: Option<SearchSpec>,
}

/// Sorted, bounded slice of the matching rows
#[derive(Debug, Clone, PartialEq)]
pub struct PageWindow {
    pub order_by: &'static str,
    pub direction: SortDirection,
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    /// Newest first, the default ordering for every resource
    pub fn newest_first(limit: u32, offset: u64) -> Self {
        Self { order_by: "created_at", direction: SortDirection::Desc, limit, offset }
    }
}

/// Storage handle for one resource kind. Implementations must be safe to share
/// between concurrent requests; callers never wrap multi-step sequences in a
/// transaction.
#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    async fn fetch(&self, predicate: &Predicate, window: &PageWindow) -> Result<Vec<Record>, StoreError>;

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Record>, StoreError>;

    /// Insert and return the row including store-generated fields
    async fn insert(&self, payload: &Payload) -> Result<Record, StoreError>;

    /// `None` when no row has this id
    async fn update_by_id(&self, id: i64, payload: &Payload) -> Result<Option<Record>, StoreError>;

    /// `false` when no row has this id
    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl<R, S> ResourceStore<R> for Arc<S>
where
    R: Resource,
    S: ResourceStore<R> + ?Sized,
{
    async fn fetch(&self, predicate: &Predicate, window: &PageWindow) -> Result<Vec<Record>, StoreError> {
        (**self).fetch(predicate, window).await
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        (**self).count(predicate).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Record>, StoreError> {
        (**self).get_by_id(id).await
    }

    async fn insert(&self, payload: &Payload) -> Result<Record, StoreError> {
        (**self).insert(payload).await
    }

    async fn update_by_id(&self, id: i64, payload: &Payload) -> Result<Option<Record>, StoreError> {
        (**self).update_by_id(id, payload).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        (**self).delete_by_id(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
