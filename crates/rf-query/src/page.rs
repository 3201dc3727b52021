//! # Page Types
//!
//! Page numbers are 1-based. A request past the last page is not an error;
//! it yields an empty item list with correct count metadata.

use rf_core::{AppError, Result};
use serde::Serialize;

/// Validated paging parameters: page number ≥ 1, page size ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u64,
    size: u64,
}

impl PageRequest {
    pub fn new(number: u64, size: u64) -> Result<Self> {
        if number < 1 {
            return Err(AppError::InvalidInput(format!(
                "page number must be at least 1, got {number}"
            )));
        }
        if size < 1 {
            return Err(AppError::InvalidInput(format!(
                "page size must be at least 1, got {size}"
            )));
        }
        Ok(Self { number, size })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Items to skip before this page starts.
    pub fn skip(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

/// One bounded slice of a filtered, sorted result set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub page_count: u64,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn assemble(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            page_number: request.number(),
            page_size: request.size(),
            page_count: total_count.div_ceil(request.size()),
            total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_page_size_and_number() {
        assert!(matches!(PageRequest::new(1, 0), Err(AppError::InvalidInput(_))));
        assert!(matches!(PageRequest::new(0, 10), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn skip_arithmetic() {
        let req = PageRequest::new(3, 10).unwrap();
        assert_eq!(req.skip(), 20);
        assert_eq!(PageRequest::new(1, 7).unwrap().skip(), 0);
    }

    #[test]
    fn page_count_is_ceiling() {
        let req = PageRequest::new(1, 10).unwrap();
        assert_eq!(Page::assemble(vec![1; 10], req, 25).page_count, 3);
        assert_eq!(Page::assemble(vec![1; 10], req, 30).page_count, 3);
        assert_eq!(Page::assemble(Vec::<i32>::new(), req, 0).page_count, 0);
    }

    #[test]
    fn past_the_end_keeps_metadata() {
        let req = PageRequest::new(4, 10).unwrap();
        let page = Page::assemble(Vec::<i32>::new(), req, 25);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 25);
        assert_eq!(page.page_count, 3);
        assert_eq!(page.page_number, 4);
    }
}
