use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Equality filters in the order the caller supplied them.
/// A repeated field keeps its first position and takes the latest value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters(Vec<(String, String)>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, FilterError> {
        let field = field.into();
        validate_column(&field)?;
        let value = value.into();
        match self.0.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.0.push((field, value)),
        }
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Case-insensitive substring match OR-ed across `fields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    pub term: String,
    pub fields: Vec<String>,
}

impl SearchSpec {
    /// `None` when the term is blank or there is nothing to search in
    pub fn new(term: &str, fields: &[&str]) -> Result<Option<Self>, FilterError> {
        let term = term.trim();
        if term.is_empty() || fields.is_empty() {
            return Ok(None);
        }
        for field in fields {
            validate_column(field)?;
        }
        Ok(Some(Self {
            term: term.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        candidate.to_lowercase().contains(&self.term.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Column names reach SQL text, so only plain identifiers are accepted
pub fn validate_column(name: &str) -> Result<(), FilterError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FilterError::InvalidColumn(name.to_string()));
    }
    Ok(())
}
