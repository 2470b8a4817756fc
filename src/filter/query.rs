use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::types::Filters;
use crate::config::QueryConfig;

/// Hard ceiling on `limit`, whatever the configuration says
pub const MAX_PAGE_LIMIT: u32 = 100;

/// List request derived from query parameters. `page` and `limit` are always
/// within range: bad input is corrected, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub filters: Filters,
}

impl QuerySpec {
    pub fn new(page: i64, limit: i64, config: &QueryConfig) -> Self {
        Self {
            search: None,
            page: clamp_page(page),
            limit: clamp_limit(limit, config.max_limit),
            filters: Filters::new(),
        }
    }

    /// Build from raw `key=value` pairs in request order
    pub fn from_params<I, K, V>(params: I, config: &QueryConfig) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page = None;
        let mut limit = None;
        let mut search = None;
        let mut filters = Filters::new();

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "page" => page = value.trim().parse::<i64>().ok(),
                "limit" => limit = value.trim().parse::<i64>().ok(),
                "search" => search = Some(value.to_string()).filter(|s| !s.trim().is_empty()),
                _ => {
                    filters.insert(key, value)?;
                }
            }
        }

        Ok(Self {
            search,
            page: clamp_page(page.unwrap_or(1)),
            limit: clamp_limit(limit.unwrap_or(config.default_limit as i64), config.max_limit),
            filters,
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

fn clamp_page(page: i64) -> u32 {
    page.clamp(1, u32::MAX as i64) as u32
}

fn clamp_limit(limit: i64, max_limit: u32) -> u32 {
    limit.clamp(1, max_limit.clamp(1, MAX_PAGE_LIMIT) as i64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit.max(1) as u64),
        }
    }
}
