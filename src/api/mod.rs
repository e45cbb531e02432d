pub mod analytics;
pub mod books;
pub mod copy;
pub mod health;
pub mod loan;
pub mod reader;

use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};

use crate::domain::DomainError;
use crate::infrastructure::AppState;

/// Map a domain failure onto an HTTP status and message
pub fn error_response(e: DomainError) -> (StatusCode, String) {
    let status = match &e {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::InvalidState(_) => StatusCode::CONFLICT,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("{}", e);
    }
    (status, e.to_string())
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Books
        .route("/books/genre/:genre_name", get(books::books_by_genre))
        // Analytics
        .route("/analytics/overdue", get(analytics::overdue))
        .route("/analytics/top-readers", get(analytics::top_readers))
        .route("/analytics/genres", get(analytics::genre_popularity))
        .route("/analytics/ranks", get(analytics::reader_ranks))
        // Loans
        .route("/loans/borrow", post(loan::borrow))
        .route("/loans/return", post(loan::return_copy))
        // Readers
        .route("/readers", post(reader::create_reader))
        .route("/readers/:id", delete(reader::delete_reader))
        // Copies
        .route("/copies/:id", get(copy::get_copy))
        .route("/copies/:id/lost", post(copy::report_lost))
        .with_state(state)
}
