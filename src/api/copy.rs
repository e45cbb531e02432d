//! Copy handlers: lookup and loss reports

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use super::error_response;
use crate::services::{catalog_service, lending_service};

pub async fn get_copy(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let copy = catalog_service::get_copy(&db, id)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "copy": copy })))
}

#[utoipa::path(
    post,
    path = "/api/copies/{id}/lost",
    params(("id" = i32, Path, description = "Book copy id")),
    responses(
        (status = 200, description = "Copy marked as lost"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn report_lost(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let copy = lending_service::report_lost(&db, id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "message": "Copy reported lost",
        "copy": copy
    })))
}
