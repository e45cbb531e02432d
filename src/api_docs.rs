use crate::api;
use crate::services::analytics_service;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::books_by_genre,
        api::analytics::overdue,
        api::analytics::top_readers,
        api::analytics::genre_popularity,
        api::analytics::reader_ranks,
        api::loan::borrow,
        api::loan::return_copy,
        api::reader::delete_reader,
        api::copy::report_lost,
    ),
    components(
        schemas(
            api::loan::BorrowRequest,
            api::loan::ReturnRequest,
            analytics_service::GenreBook,
            analytics_service::OverdueLoan,
            analytics_service::ReaderLoanCount,
            analytics_service::GenreLoanCount,
            analytics_service::ReaderRank,
        )
    ),
    tags(
        (name = "library-loans", description = "Library lending API")
    )
)]
pub struct ApiDoc;
