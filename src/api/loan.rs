use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::error_response;
use crate::infrastructure::AppState;
use crate::services::lending_service;

#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub book_copy_id: i32,
    pub reader_id: i32,
    /// Loan period in days, defaults to DEFAULT_LOAN_DAYS
    pub days: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    pub book_copy_id: i32,
}

#[utoipa::path(
    post,
    path = "/api/loans/borrow",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Copy lent"),
        (status = 404, description = "Copy or reader not found"),
        (status = 409, description = "Copy is not available")
    )
)]
pub async fn borrow(
    State(state): State<AppState>,
    Json(payload): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, String)> {
    let days = payload.days.unwrap_or(state.default_loan_days);

    let loan = lending_service::borrow(state.db(), payload.book_copy_id, payload.reader_id, days)
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Loan created successfully",
            "loan_id": loan.id,
            "due_date": loan.due_date,
            "loan": loan
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/loans/return",
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Copy returned"),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Copy has no outstanding loan")
    )
)]
pub async fn return_copy(
    State(state): State<AppState>,
    Json(payload): Json<ReturnRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let loan = lending_service::return_copy(state.db(), payload.book_copy_id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({
        "message": "Loan returned successfully",
        "returned_at": loan.returned_at,
        "loan": loan
    })))
}
