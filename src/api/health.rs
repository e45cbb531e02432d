use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde_json::{json, Value};

/// Liveness plus a storage round-trip; 503 when the database cannot be reached
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and database are healthy"),
        (status = 503, description = "Database unreachable")
    )
)]
pub async fn health_check(State(db): State<DatabaseConnection>) -> (StatusCode, Json<Value>) {
    let backend = format!("{:?}", db.get_database_backend()).to_lowercase();

    let (status, reachable) = match db.ping().await {
        Ok(()) => (StatusCode::OK, true),
        Err(e) => {
            tracing::error!("Health check: database unreachable: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, false)
        }
    };

    (
        status,
        Json(json!({
            "status": if reachable { "ok" } else { "degraded" },
            "service": "library-loans",
            "version": env!("CARGO_PKG_VERSION"),
            "database": {
                "backend": backend,
                "reachable": reachable
            }
        })),
    )
}
