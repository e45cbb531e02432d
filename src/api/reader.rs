use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use super::error_response;
use crate::models::reader::NewReader;
use crate::services::{catalog_service, lending_service};

pub async fn create_reader(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<NewReader>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    let reader = catalog_service::register_reader(&db, payload)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(json!({ "reader": reader }))))
}

#[utoipa::path(
    delete,
    path = "/api/readers/{id}",
    params(("id" = i32, Path, description = "Reader id")),
    responses(
        (status = 200, description = "Reader and loan history deleted"),
        (status = 404, description = "Reader not found")
    )
)]
pub async fn delete_reader(
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let deletion = lending_service::delete_reader(&db, id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "status": "deleted",
        "reader_id": deletion.reader_id,
        "name": deletion.name,
        "loans_deleted": deletion.loans_deleted,
        "copies_released": deletion.copies_released
    })))
}
