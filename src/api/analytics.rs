use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{json, Value};

use super::error_response;
use crate::infrastructure::AppState;
use crate::services::analytics_service;

#[derive(Deserialize)]
pub struct TopReadersQuery {
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/analytics/overdue",
    responses((status = 200, description = "Outstanding loans past due", body = [analytics_service::OverdueLoan]))
)]
pub async fn overdue(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let loans = analytics_service::overdue_loans(&db)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "overdue": loans })))
}

#[utoipa::path(
    get,
    path = "/api/analytics/top-readers",
    params(("limit" = Option<u64>, Query, description = "Maximum rows, defaults to TOP_READERS_LIMIT")),
    responses((status = 200, description = "Readers with the most loans", body = [analytics_service::ReaderLoanCount]))
)]
pub async fn top_readers(
    State(state): State<AppState>,
    Query(query): Query<TopReadersQuery>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(state.top_readers_limit);
    let readers = analytics_service::top_readers(state.db(), limit)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "readers": readers })))
}

#[utoipa::path(
    get,
    path = "/api/analytics/genres",
    responses((status = 200, description = "Loan count per genre", body = [analytics_service::GenreLoanCount]))
)]
pub async fn genre_popularity(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let genres = analytics_service::genre_popularity(&db)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "genres": genres })))
}

#[utoipa::path(
    get,
    path = "/api/analytics/ranks",
    responses((status = 200, description = "Readers ranked by loan count", body = [analytics_service::ReaderRank]))
)]
pub async fn reader_ranks(
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let ranks = analytics_service::reader_ranks(&db)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({ "ranks": ranks })))
}
