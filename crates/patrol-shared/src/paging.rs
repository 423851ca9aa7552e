//! Paginated list requests and the envelopes the backend answers with

use serde_json::Value;

use crate::{
    const_config::client::screens::SCREEN_DEFAULT_PAGE_SIZE,
    wire::{lenient_u64, Object, Variants},
};

const KEY_ITEMS: Variants = Variants(&["items", "data", "users", "rows"]);
const KEY_TOTAL: Variants = Variants(&["total", "count"]);
const KEY_PAGE: Variants = Variants(&["page"]);
const KEY_SIZE: Variants = Variants(&["size"]);

/// `page` starts at 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub size: u32,
    pub q: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: SCREEN_DEFAULT_PAGE_SIZE,
            q: String::new(),
        }
    }
}

impl ListQuery {
    /// Query string pairs, the search term only when not blank
    pub fn as_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut result = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        let q = self.q.trim();
        if !q.is_empty() {
            result.push(("q", q.to_string()));
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl<T> PagedResult<T> {
    pub fn empty(query: &ListQuery) -> Self {
        Self {
            items: Vec::new(),
            page: query.page,
            size: query.size,
            total: 0,
        }
    }

    /// Reads whichever envelope the list endpoint used. Items are passed
    /// through `map_item`, entries it rejects are skipped. Missing metadata
    /// falls back to the request values and the item count
    pub fn from_wire(
        value: &Value,
        query: &ListQuery,
        map_item: impl Fn(&Object) -> Option<T>,
    ) -> Self {
        let top = value.as_object();
        // Metadata may sit next to the items inside a `data` object
        let container = top
            .and_then(|obj| obj.get("data"))
            .and_then(Value::as_object)
            .or(top);

        let raw_items: &[Value] = match value {
            Value::Array(items) => items,
            Value::Object(obj) => KEY_ITEMS
                .array(obj)
                .or_else(|| container.and_then(|c| KEY_ITEMS.array(c)))
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        };
        let items: Vec<T> = raw_items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(map_item)
            .collect();

        let meta = |variants: Variants| {
            container
                .and_then(|c| variants.lookup(c))
                .or_else(|| top.and_then(|t| variants.lookup(t)))
                .and_then(lenient_u64)
                .filter(|n| *n > 0)
        };
        Self {
            total: meta(KEY_TOTAL).unwrap_or(items.len() as u64),
            page: meta(KEY_PAGE)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(query.page),
            size: meta(KEY_SIZE)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(query.size),
            items,
        }
    }
}

/// Pure pagination arithmetic used by the list screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl Pagination {
    /// Never less than 1
    pub fn page_count(&self) -> u32 {
        if self.size == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(self.size as u64).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        (self.page as u64) * (self.size as u64) < self.total
    }

    pub fn is_valid_page(&self, page: u32) -> bool {
        (1..=self.page_count()).contains(&page)
    }
}
