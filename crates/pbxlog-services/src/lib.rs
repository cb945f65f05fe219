//! Read-side services for pbxlog
//!
//! This crate turns raw rows from the call store into pages a renderer can
//! draw directly: request normalization, pagination and per-call banding.
//!
//! # Services
//!
//! - `CallListingService` - Paginated call listing with cyclic call grouping
//! - `GroupBander` - Per-request call id to band assignment

pub mod call_listing;

pub use call_listing::{CallListingService, GroupBander, ListingRequest};

/// Listing constants
pub mod constants {
    /// Smallest accepted row limit
    pub const MIN_LIMIT: i64 = 1;

    /// First page number
    pub const FIRST_PAGE: i64 = 1;

    /// First band assigned to a call
    pub const FIRST_GROUP: u32 = 1;
}
