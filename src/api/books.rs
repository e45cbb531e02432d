use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use super::error_response;
use crate::services::analytics_service;

#[utoipa::path(
    get,
    path = "/api/books/genre/{genre_name}",
    params(("genre_name" = String, Path, description = "Exact genre name")),
    responses(
        (status = 200, description = "Books of the genre, newest first", body = [analytics_service::GenreBook]),
        (status = 404, description = "No books for this genre")
    )
)]
pub async fn books_by_genre(
    State(db): State<DatabaseConnection>,
    Path(genre_name): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let books = analytics_service::books_by_genre(&db, &genre_name)
        .await
        .map_err(error_response)?;

    if books.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No books found for genre '{}'", genre_name),
        ));
    }

    Ok(Json(json!({ "books": books, "total": books.len() })))
}
