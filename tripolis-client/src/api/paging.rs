//! Pagination engine
//!
//! Walks every page of a paged listing and merges the pages into one result.

use log::debug;
use serde_json::{Map, Value};

use super::client::TripolisClient;
use super::tree::{merge_union, parameter_group_mut};
use super::Operation;
use crate::{Result, TripolisError};

pub const PAGING_KEY: &str = "paging";
pub const PAGE_SIZE_FIELD: &str = "pageSize";
/// Wire name of the page number field
pub const PAGE_NUMBER_FIELD: &str = "pageNr";
pub const TOTAL_ITEMS_FIELD: &str = "totalItems";

/// Position within a paged listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    pub page_size: u32,
    /// 1-based
    pub page_number: u32,
    /// Total reported by the server for the last fetched page
    pub total_items: Option<u64>,
}

impl PageDescriptor {
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size,
            page_number: 1,
            total_items: None,
        }
    }

    /// Whether another page should be fetched after the current one.
    ///
    /// Stops once `page_number * page_size >= total_items`, or when no total
    /// was reported.
    pub fn has_more(&self) -> bool {
        match self.total_items {
            Some(total) => u64::from(self.page_number) * u64::from(self.page_size) < total,
            None => false,
        }
    }
}

impl TripolisClient {
    /// Fetch all pages of `operation` using the configured page size
    pub async fn paged_call(&self, operation: Operation, request: Value) -> Result<Value> {
        self.paged_call_with_size(operation, request, self.page_size)
            .await
    }

    /// Fetch all pages of `operation` and return their recursive union.
    ///
    /// `request` must be a mapping whose first key is the operation's parameter
    /// group; `paging.pageSize` and `paging.pageNr` are set inside it. A fault on
    /// any page aborts the walk and nothing is returned.
    pub async fn paged_call_with_size(
        &self,
        operation: Operation,
        mut request: Value,
        page_size: u32,
    ) -> Result<Value> {
        if page_size == 0 {
            return Err(TripolisError::InvalidRequest(
                "page size must be positive".to_string(),
            ));
        }

        set_paging_field(&mut request, PAGE_SIZE_FIELD, page_size)?;

        let mut merged = Value::Object(Map::new());
        let mut page = PageDescriptor::first(page_size);

        loop {
            set_paging_field(&mut request, PAGE_NUMBER_FIELD, page.page_number)?;
            let result = self.call(operation, &request).await?;

            page.total_items = reported_total(&result);
            let more = matches!(&result, Value::Object(map) if !map.is_empty()) && page.has_more();

            debug!(
                "{}.{}: page {} fetched ({} per page, total {:?})",
                self.service(),
                operation,
                page.page_number,
                page.page_size,
                page.total_items
            );

            if !is_empty(&result) {
                merge_union(&mut merged, result);
            }

            if !more {
                break;
            }
            page.page_number += 1;
        }

        Ok(merged)
    }
}

fn set_paging_field(request: &mut Value, field: &str, value: u32) -> Result<()> {
    let group = parameter_group_mut(request).ok_or_else(|| {
        TripolisError::InvalidRequest(
            "paged request needs a named parameter group as its first key".to_string(),
        )
    })?;

    let paging = group
        .entry(PAGING_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !paging.is_object() {
        *paging = Value::Object(Map::new());
    }
    if let Value::Object(paging) = paging {
        paging.insert(field.to_string(), Value::from(value));
    }
    Ok(())
}

fn reported_total(result: &Value) -> Option<u64> {
    match result.get(PAGING_KEY)?.get(TOTAL_ITEMS_FIELD)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
