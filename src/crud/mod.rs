// Table-agnostic list/get/create/update/delete over a single resource store.
//
// Update and Delete check existence before writing so a missing id surfaces as
// NotFound instead of a silent no-op. The check and the write are separate
// store calls: concurrent writers to one id race and the last write wins.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::record::{Payload, PayloadError, Record};
use crate::database::store::{PageWindow, Predicate, ResourceStore, StoreError};
use crate::filter::{FilterError, Pagination, QuerySpec, SearchSpec};
use crate::resources::Resource;
use crate::types::Operation;

#[derive(Debug, Error)]
pub enum CrudError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<BTreeMap<String, String>>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl CrudError {
    pub fn validation(message: impl Into<String>) -> Self {
        CrudError::Validation { message: message.into(), field_errors: None }
    }
}

// A row the adapter returned but could not decode is a glue-code fault, not
// an adapter failure
impl From<StoreError> for CrudError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Decode(message) => CrudError::Unexpected(message),
            other => CrudError::Store(other),
        }
    }
}

impl From<PayloadError> for CrudError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::InvalidFields(fields) => CrudError::Validation {
                message: "Invalid fields".to_string(),
                field_errors: Some(fields),
            },
            other => CrudError::validation(other.to_string()),
        }
    }
}

impl From<FilterError> for CrudError {
    fn from(err: FilterError) -> Self {
        CrudError::validation(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated {
    pub data: Vec<Record>,
    pub pagination: Pagination,
}

/// Confirmation returned by Delete in place of the removed record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deleted {
    pub id: i64,
    pub message: String,
}

pub struct CrudEngine<R, S> {
    store: S,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S> CrudEngine<R, S>
where
    R: Resource,
    S: ResourceStore<R>,
{
    pub fn new(store: S) -> Self {
        Self { store, _resource: PhantomData }
    }

    /// Count and fetch run as two independent store calls over the same
    /// predicate; `total` may drift from `data` under concurrent writes.
    pub async fn list(&self, spec: &QuerySpec) -> Result<Paginated, CrudError> {
        let search = match spec.search.as_deref() {
            Some(term) => SearchSpec::new(term, R::SEARCH_FIELDS)?,
            None => None,
        };
        if spec.search.is_some() && search.is_none() {
            debug!("{}: search ignored, resource declares no search fields", R::NAME);
        }
        let predicate = Predicate { filters: spec.filters.clone(), search };

        let total = self.store.count(&predicate).await?;
        let window = PageWindow::newest_first(spec.limit, spec.offset());
        let data = self.store.fetch(&predicate, &window).await?;

        debug!(
            "{}: listed {} of {} (page {}, limit {})",
            R::NAME,
            data.len(),
            total,
            spec.page,
            spec.limit
        );
        Ok(Paginated {
            data,
            pagination: Pagination::new(spec.page, spec.limit, total),
        })
    }

    pub async fn get(&self, id: &str) -> Result<Record, CrudError> {
        let id = parse_id(id)?;
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found::<R>(id))
    }

    /// The body is stored as given once it passes payload validation;
    /// the returned record carries the store-generated id and timestamps.
    pub async fn create(&self, body: Value) -> Result<Record, CrudError> {
        let payload = Payload::parse::<R>(body, Operation::Create)?;
        let record = self.store.insert(&payload).await?;
        info!("{}: created record {}", R::NAME, record.id);
        Ok(record)
    }

    pub async fn update(&self, id: &str, body: Value) -> Result<Record, CrudError> {
        let id = parse_id(id)?;
        let payload = Payload::parse::<R>(body, Operation::Update)?;

        self.ensure_exists(id).await?;
        let record = self
            .store
            .update_by_id(id, &payload)
            .await?
            .ok_or_else(|| not_found::<R>(id))?;

        info!("{}: updated record {}", R::NAME, id);
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> Result<Deleted, CrudError> {
        let id = parse_id(id)?;
        self.ensure_exists(id).await?;

        if !self.store.delete_by_id(id).await? {
            return Err(not_found::<R>(id));
        }

        info!("{}: deleted record {}", R::NAME, id);
        Ok(Deleted {
            id,
            message: format!("{} record {} deleted", R::NAME, id),
        })
    }

    async fn ensure_exists(&self, id: i64) -> Result<(), CrudError> {
        match self.store.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(not_found::<R>(id)),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, CrudError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| CrudError::validation(format!("Invalid id '{}': expected an integer", raw)))
}

fn not_found<R: Resource>(id: i64) -> CrudError {
    CrudError::NotFound(format!("{} record {} not found", R::NAME, id))
}
