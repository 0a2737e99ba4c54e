//! Offset pagination requests and the result envelope.

use serde::Serialize;

use crate::{Order, OrderBy, Statement, StoreError};

/// A page request. `page` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationRequest {
    pub page: u64,
    pub page_size: u64,
    pub filter: Option<Statement>,
    pub order_by: Option<OrderBy>,
}

impl PaginationRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page,
            page_size,
            filter: None,
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Statement) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Order) -> Self {
        self.order_by = Some(OrderBy::new(field, direction));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if self.page == 0 {
            return Err(StoreError::InvalidPagination(
                "page is 1-based".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(StoreError::InvalidPagination(
                "page size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One page of rows plus the totals for the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<E> {
    pub data: Vec<E>,
    pub total_count: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
}

impl<E> PaginatedResult<E> {
    pub(crate) fn new(data: Vec<E>, total_count: u64, request: &PaginationRequest) -> Self {
        Self {
            data,
            total_count,
            total_pages: total_count.div_ceil(request.page_size),
            current_page: request.page,
            page_size: request.page_size,
        }
    }
}
