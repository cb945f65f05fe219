//! Call listing DTOs

use super::common::deserialize_lenient_number;
use pbxlog_services::ListingRequest;
use serde::Deserialize;

/// Query parameters of the call listing.
///
/// Missing, non-numeric or out-of-range values fall back to the listing
/// defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CallListParams {
    /// Rows per page (at least 1)
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub limit: Option<i64>,

    /// Rows to skip (at least 0); ignored past the first page
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub offset: Option<i64>,

    /// Page number (1-indexed)
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub page: Option<i64>,
}

impl From<CallListParams> for ListingRequest {
    fn from(params: CallListParams) -> Self {
        Self {
            limit: params.limit,
            offset: params.offset,
            page: params.page,
        }
    }
}
