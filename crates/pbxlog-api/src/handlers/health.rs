//! Health check handler

use actix_web::HttpResponse;

/// Report that the HTTP side is up
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "pbxlog",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
