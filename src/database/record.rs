use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::filter::types::validate_column;
use crate::resources::Resource;
use crate::types::Operation;

/// System fields that only the store may assign
pub const SYSTEM_FIELDS: &[&str] = &["id", "created_at", "updated_at"];

/// A stored row. The core only interprets `id` and `created_at`; everything
/// else rides along untouched in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Build a record from a JSON row as returned by the store
    pub fn from_row(row: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row)
    }
}

/// Errors raised while turning a request body into a [`Payload`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("Expected a JSON object")]
    NotAnObject,
    #[error("Payload contains no fields")]
    Empty,
    #[error("Invalid fields")]
    InvalidFields(BTreeMap<String, String>),
}

/// Validated create/update body: known fields checked against the resource's
/// declarations, anything else kept in `extra` for the store to judge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    known: Map<String, Value>,
    extra: Map<String, Value>,
}

impl Payload {
    pub fn parse<R: Resource>(body: Value, operation: Operation) -> Result<Self, PayloadError> {
        let Value::Object(map) = body else {
            return Err(PayloadError::NotAnObject);
        };

        let mut payload = Payload::default();
        let mut field_errors = BTreeMap::new();

        for (key, value) in map {
            if SYSTEM_FIELDS.contains(&key.as_str()) {
                field_errors.insert(key, "System field cannot be set via API".to_string());
                continue;
            }
            match R::field(&key) {
                Some(spec) => {
                    if value.is_null() {
                        if spec.required {
                            field_errors.insert(key, "This field is required".to_string());
                            continue;
                        }
                    } else if !spec.kind.matches(&value) {
                        field_errors.insert(key, format!("Expected {}", spec.kind.name()));
                        continue;
                    }
                    payload.known.insert(key, value);
                }
                None => {
                    if validate_column(&key).is_err() {
                        field_errors.insert(key, "Invalid field name".to_string());
                        continue;
                    }
                    payload.extra.insert(key, value);
                }
            }
        }

        if operation == Operation::Create {
            for spec in R::FIELDS.iter().filter(|f| f.required) {
                if !payload.known.contains_key(spec.name) && !field_errors.contains_key(spec.name) {
                    field_errors.insert(spec.name.to_string(), "This field is required".to_string());
                }
            }
        }

        if !field_errors.is_empty() {
            return Err(PayloadError::InvalidFields(field_errors));
        }
        if operation == Operation::Update && payload.is_empty() {
            return Err(PayloadError::Empty);
        }

        Ok(payload)
    }

    pub fn known(&self) -> &Map<String, Value> {
        &self.known
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.known.get(key).or_else(|| self.extra.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extra.is_empty()
    }

    /// Column names in write order: known fields first, then extras
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.known.keys().chain(self.extra.keys())
    }

    /// All fields merged into one object, as sent to the store
    pub fn to_object(&self) -> Map<String, Value> {
        let mut merged = self.known.clone();
        merged.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}
