//! Read-side call rows
//!
//! Rows as returned by the call store, enriched with directory names, and the
//! page value object handed to a renderer.

use serde::{Deserialize, Serialize};

/// A stored call leg joined with its directory names.
///
/// Names that did not resolve are empty strings, never missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCall {
    pub call_id: i64,
    pub extension: i64,
    /// Display name of the extension from the directory
    pub extension_name: String,
    pub auth: String,
    /// Display name of the authorization code from the directory
    pub auth_name: String,
    pub call_time: String,
    pub duration: String,
    pub type_code: String,
    pub dialed: String,
    pub account: String,
    /// Cost as decimal text; empty when the stored value is NULL
    pub cost: String,
    pub clid: String,
    pub clid_name: String,
    pub pilot_number: String,
    pub ring_time: String,
}

/// A call leg with its visual band.
///
/// All legs of one call id share the same `group` within a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRow {
    #[serde(flatten)]
    pub call: StoredCall,

    /// Cyclic band number, starting at 1
    pub group: u32,
}

/// One page of the call listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPage {
    pub rows: Vec<CallRow>,

    /// Requested page number (1-indexed)
    pub page: i64,

    /// Previous page number, never below 1
    pub prev: i64,

    /// Next page number
    pub next: i64,

    /// Effective row limit used by the query
    pub limit: i64,

    /// Effective row offset used by the query
    pub offset: i64,
}

impl CallPage {
    /// Number of distinct calls on this page
    pub fn distinct_calls(&self) -> usize {
        let mut seen: Vec<i64> = self.rows.iter().map(|r| r.call.call_id).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    /// Check if the page holds no rows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(call_id: i64, group: u32) -> CallRow {
        CallRow {
            call: StoredCall {
                call_id,
                ..Default::default()
            },
            group,
        }
    }

    #[test]
    fn test_distinct_calls() {
        let page = CallPage {
            rows: vec![row(7, 1), row(7, 1), row(5, 2), row(9, 1)],
            page: 1,
            prev: 1,
            next: 2,
            limit: 200,
            offset: 0,
        };
        assert_eq!(page.distinct_calls(), 3);
        assert!(!page.is_empty());
    }

    #[test]
    fn test_call_row_serializes_flat() {
        let value = serde_json::to_value(row(42, 2)).unwrap();
        assert_eq!(value["call_id"], 42);
        assert_eq!(value["group"], 2);
        assert_eq!(value["extension_name"], "");
        assert!(value.get("call").is_none());
    }
}
