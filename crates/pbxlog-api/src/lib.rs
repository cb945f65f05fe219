//! API layer for pbxlog
//!
//! Read-only HTTP access to stored call records: the paginated, banded call
//! listing and a health check.

#![forbid(unsafe_code)]
#![warn(clippy::all, missing_docs)]

pub mod dto;
pub mod handlers;

use actix_web::web;

pub use dto::CallListParams;
pub use handlers::{configure_calls, health_check};

/// Mount every API route under `/api/v1`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(configure_calls),
    );
}
