//! Common traits for repositories
//!
//! Defines the two seams between the pipeline and storage: the append-only
//! write side used by ingestion, and the read side used by the call listing.

use crate::error::AppError;
use crate::models::{Cdr, StoredCall};
use async_trait::async_trait;

/// Append-only store of parsed call records
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Append one record. Rows are never updated or deleted.
    async fn append(&self, cdr: &Cdr) -> Result<(), AppError>;
}

/// Read access to stored calls in canonical order
/// (call time descending, then call id descending)
#[async_trait]
pub trait CallQuery: Send + Sync {
    /// Fetch one window of rows with directory names resolved
    async fn fetch_calls(&self, window: PageWindow) -> Result<Vec<StoredCall>, AppError>;
}

/// Row window for a single query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.max(1),
            offset: offset.max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_bounds() {
        let w = PageWindow::new(0, -5);
        assert_eq!(w.limit, 1);
        assert_eq!(w.offset, 0);

        let w = PageWindow::new(50, 100);
        assert_eq!(w, PageWindow { limit: 50, offset: 100 });
    }
}
