use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Row};
use std::marker::PhantomData;

use crate::database::record::{Payload, Record};
use crate::database::store::{PageWindow, Predicate, ResourceStore, StoreError};
use crate::resources::Resource;

/// Postgres-backed store for resource `R`. Rows travel as JSON
/// (`row_to_json`) and writes are coerced to column types by
/// `jsonb_populate_record`, so the adapter never needs a static schema.
pub struct PgStore<R> {
    pool: PgPool,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for PgStore<R> {
    fn clone(&self) -> Self {
        Self { pool: self.pool.clone(), _resource: PhantomData }
    }
}

impl<R: Resource> PgStore<R> {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, _resource: PhantomData }
    }

    fn table() -> String {
        quote_ident(R::NAME)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Escape LIKE wildcards so the search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Render the predicate as a WHERE clause with text parameters starting at `$1`.
/// Equality filters keep the caller's order; search is OR-ed across its fields.
fn where_sql(predicate: &Predicate) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for (field, value) in predicate.filters.iter() {
        params.push(value.to_string());
        conditions.push(format!("{}::text = ${}", quote_ident(field), params.len()));
    }

    if let Some(search) = &predicate.search {
        params.push(like_pattern(&search.term));
        let index = params.len();
        let alternatives = search
            .fields
            .iter()
            .map(|f| format!("{}::text ILIKE ${}", quote_ident(f), index))
            .collect::<Vec<_>>()
            .join(" OR ");
        conditions.push(format!("({})", alternatives));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, params)
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Record, StoreError> {
    let value: Value = row.try_get("row")?;
    Ok(Record::from_row(value)?)
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for PgStore<R> {
    async fn fetch(&self, predicate: &Predicate, window: &PageWindow) -> Result<Vec<Record>, StoreError> {
        let (where_clause, params) = where_sql(predicate);
        let order = quote_ident(window.order_by);
        let direction = window.direction.to_sql();
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {table}{where_clause} ORDER BY {order} {direction}, \"id\" {direction} LIMIT {limit} OFFSET {offset}) t ORDER BY t.{order} {direction}, t.\"id\" {direction}",
            table = Self::table(),
            limit = window.limit,
            offset = window.offset,
        );

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let (where_clause, params) = where_sql(predicate);
        let sql = format!("SELECT COUNT(*) AS count FROM {}{}", Self::table(), where_clause);

        let mut query = sqlx::query(&sql);
        for param in &params {
            query = query.bind(param);
        }
        let row = query.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Record>, StoreError> {
        let sql = format!("SELECT row_to_json(t) AS row FROM {} t WHERE t.\"id\" = $1", Self::table());
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn insert(&self, payload: &Payload) -> Result<Record, StoreError> {
        let table = Self::table();
        let sql = if payload.is_empty() {
            format!(
                "WITH written AS (INSERT INTO {table} DEFAULT VALUES RETURNING *) \
                 SELECT row_to_json(written) AS row FROM written"
            )
        } else {
            let columns = payload.columns().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
            format!(
                "WITH written AS (INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) RETURNING *) \
                 SELECT row_to_json(written) AS row FROM written"
            )
        };

        let mut query = sqlx::query(&sql);
        if !payload.is_empty() {
            query = query.bind(Value::Object(payload.to_object()));
        }
        let row = query.fetch_one(&self.pool).await?;
        decode_row(&row)
    }

    async fn update_by_id(&self, id: i64, payload: &Payload) -> Result<Option<Record>, StoreError> {
        let table = Self::table();
        let assignments = payload
            .columns()
            .map(|c| format!("{col} = src.{col}", col = quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "WITH written AS (UPDATE {table} AS target SET {assignments} FROM jsonb_populate_record(NULL::{table}, $1) AS src WHERE target.\"id\" = $2 RETURNING target.*) \
             SELECT row_to_json(written) AS row FROM written"
        );

        let row = sqlx::query(&sql)
            .bind(Value::Object(payload.to_object()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE \"id\" = $1", Self::table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
