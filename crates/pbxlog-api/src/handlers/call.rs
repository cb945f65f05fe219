//! Call listing handlers

use crate::dto::CallListParams;
use actix_web::{
    web::{self, Data, Json, Query},
    Result,
};
use pbxlog_core::models::CallPage;
use pbxlog_services::CallListingService;
use tracing::{debug, instrument};

/// List stored calls, newest first, banded per call id
///
/// # Errors
///
/// Returns a structured 500 response if the store query fails.
///
/// # Examples
///
/// ```text
/// GET /api/v1/calls?limit=50&page=2
/// ```
#[instrument(skip(service))]
pub async fn list_calls(
    query: Query<CallListParams>,
    service: Data<CallListingService>,
) -> Result<Json<CallPage>> {
    let page = service.list(query.into_inner().into()).await?;

    debug!(
        rows = page.rows.len(),
        calls = page.distinct_calls(),
        page = page.page,
        "Listed calls"
    );

    Ok(Json(page))
}

/// Configure call routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/calls").route("", web::get().to(list_calls)));
}
