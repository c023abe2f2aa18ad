//! Filtering and pagination for the ad list.

use serde::Deserialize;

use super::repo_types::Ad;
use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw query string of `GET /ads`. Everything is a string so that bad numbers
/// become validation errors with a readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAdsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
}

/// Conjunction of optional predicates. Blank strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdFilter {
    pub category: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl ListAdsQuery {
    pub fn into_parts(self) -> AppResult<(AdFilter, PageRequest)> {
        let page = parse_int(self.page, "page")?;
        let limit = parse_int(self.limit, "limit")?;
        let filter = AdFilter {
            category: non_blank(self.category),
            city: non_blank(self.city),
            min_price: parse_price(self.min_price, "minPrice")?,
            max_price: parse_price(self.max_price, "maxPrice")?,
            search: non_blank(self.search),
        };
        Ok((filter, PageRequest::new(page, limit)))
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_int(v: Option<String>, field: &str) -> AppResult<Option<i64>> {
    non_blank(v)
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::validation(format!("{field} must be an integer")))
        })
        .transpose()
}

/// Finite, non-negative decimal.
pub fn parse_price(v: Option<String>, field: &str) -> AppResult<Option<f64>> {
    non_blank(v)
        .map(|s| match s.parse::<f64>() {
            Ok(p) if p.is_finite() && p >= 0.0 => Ok(p),
            _ => Err(AppError::validation(format!(
                "{field} must be a non-negative number"
            ))),
        })
        .transpose()
}

impl AdFilter {
    pub fn matches(&self, ad: &Ad) -> bool {
        if self.category.as_ref().is_some_and(|c| &ad.category != c) {
            return false;
        }
        if self.city.as_ref().is_some_and(|c| &ad.city != c) {
            return false;
        }
        if self.min_price.is_some_and(|min| ad.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| ad.price > max) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            return ad.title.to_lowercase().contains(&needle)
                || ad.description.to_lowercase().contains(&needle);
        }
        true
    }

    /// `ILIKE` pattern for the free-text search, if any.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|s| format!("%{}%", escape_like(s)))
    }
}

/// Escapes `LIKE` metacharacters so user input matches literally.
pub fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl PageRequest {
    /// Page numbers start at 1; the size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }

    pub fn result<T>(&self, items: Vec<T>, total: i64) -> PageResult<T> {
        PageResult {
            items,
            page: self.page,
            total,
            total_pages: self.total_pages(total),
        }
    }
}
