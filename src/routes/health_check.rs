use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::store::IdiomStore;

/// Readiness probe; 503 when the store cannot be reached
pub async fn health_check(idioms: web::Data<dyn IdiomStore>) -> HttpResponse {
    tracing::debug!("Health check endpoint called");

    match idioms.sample_exists().await {
        Ok(sample_exists) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "db_connected": true,
            "db_sample_exists": sample_exists,
        })),
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach the store");
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "db_connected": false,
            }))
        }
    }
}
