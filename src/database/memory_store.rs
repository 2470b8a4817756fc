use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

use crate::database::record::{Payload, Record};
use crate::database::store::{PageWindow, Predicate, ResourceStore, StoreError};
use crate::filter::SortDirection;
use crate::resources::Resource;

/// Process-local store for resource `R`, used when no database is configured
/// and in tests. Ids are assigned sequentially from 1.
pub struct MemoryStore<R> {
    rows: RwLock<Vec<Record>>,
    next_id: AtomicI64,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

/// Text form of a field for equality and search matching; `None` never matches
fn field_text(record: &Record, field: &str) -> Option<String> {
    match field {
        "id" => Some(record.id.to_string()),
        "created_at" => Some(record.created_at.to_rfc3339()),
        _ => match record.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        },
    }
}

fn matches(record: &Record, predicate: &Predicate) -> bool {
    let filters_match = predicate
        .filters
        .iter()
        .all(|(field, value)| field_text(record, field).as_deref() == Some(value));

    let search_match = predicate.search.as_ref().map_or(true, |search| {
        search
            .fields
            .iter()
            .filter_map(|f| field_text(record, f))
            .any(|text| search.matches(&text))
    });

    filters_match && search_match
}

fn compare(a: &Record, b: &Record, window: &PageWindow) -> Ordering {
    let ordering = match window.order_by {
        "created_at" => a.created_at.cmp(&b.created_at),
        "id" => a.id.cmp(&b.id),
        field => field_text(a, field).cmp(&field_text(b, field)),
    }
    .then(a.id.cmp(&b.id));

    match window.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn fetch(&self, predicate: &Predicate, window: &PageWindow) -> Result<Vec<Record>, StoreError> {
        let rows = self.rows.read().await;
        let mut selected: Vec<Record> = rows.iter().filter(|r| matches(r, predicate)).cloned().collect();
        selected.sort_by(|a, b| compare(a, b, window));
        Ok(selected
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|r| matches(r, predicate)).count() as u64)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Record>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, payload: &Payload) -> Result<Record, StoreError> {
        let record = Record {
            id: self.next_id.fetch_add(1, AtomicOrdering::SeqCst),
            created_at: Utc::now(),
            fields: payload.to_object(),
        };
        self.rows.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, id: i64, payload: &Payload) -> Result<Option<Record>, StoreError> {
        let mut rows = self.rows.write().await;
        let Some(record) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        record.fields.extend(payload.to_object());
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Filters, SearchSpec};
    use crate::resources::Product;
    use crate::types::Operation;
    use serde_json::json;

    async fn seeded() -> MemoryStore<Product> {
        let store = MemoryStore::<Product>::new();
        for (name, category) in [("Hammer", "tools"), ("Rake", "garden"), ("Saw", "tools")] {
            let payload = Payload::parse::<Product>(
                json!({ "name": name, "category": category, "is_active": true }),
                Operation::Create,
            )
            .unwrap();
            ResourceStore::<Product>::insert(&store, &payload).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn fetch_is_newest_first() {
        let store = seeded().await;
        let rows = store
            .fetch(&Predicate::default(), &PageWindow::newest_first(10, 0))
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn filters_compare_text_forms() {
        let store = seeded().await;
        let mut filters = Filters::new();
        filters.insert("category", "tools").unwrap();
        filters.insert("is_active", "true").unwrap();
        let predicate = Predicate { filters, search: None };

        assert_eq!(store.count(&predicate).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let store = seeded().await;
        let predicate = Predicate {
            filters: Filters::new(),
            search: SearchSpec::new("RAK", &["name"]).unwrap(),
        };
        let rows = store.fetch(&predicate, &PageWindow::newest_first(10, 0)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&json!("Rake")));
    }

    #[tokio::test]
    async fn update_merges_and_delete_reports_absence() {
        let store = seeded().await;
        let payload = Payload::parse::<Product>(json!({ "price": 9.5 }), Operation::Update).unwrap();
        let updated = store.update_by_id(1, &payload).await.unwrap().unwrap();
        assert_eq!(updated.get("name"), Some(&json!("Hammer")));
        assert_eq!(updated.get("price"), Some(&json!(9.5)));

        assert!(store.update_by_id(99, &payload).await.unwrap().is_none());
        assert!(store.delete_by_id(1).await.unwrap());
        assert!(!store.delete_by_id(1).await.unwrap());
        assert_eq!(store.len().await, 2);
    }
}
