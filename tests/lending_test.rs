//! Lending engine tests, mostly against an in-memory SQLite database

use chrono::{Duration, Local};
use library_loans::db;
use library_loans::domain::DomainError;
use library_loans::models::reader::NewReader;
use library_loans::models::{book_copy, loan, reader, CopyStatus};
use library_loans::services::catalog_service::{self, NewBook};
use library_loans::services::lending_service;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// Helper to create a reader with a unique email
async fn create_test_reader(db: &DatabaseConnection, first_name: &str) -> reader::Model {
    catalog_service::register_reader(
        db,
        NewReader {
            first_name: first_name.to_string(),
            last_name: "Reader".to_string(),
            email: format!("{}@test.com", first_name.to_lowercase()),
            phone_number: None,
        },
    )
    .await
    .expect("Failed to create reader")
}

// Helper to create one SciFi book with `copies` available copies
async fn create_test_copies(db: &DatabaseConnection, copies: usize) -> Vec<book_copy::Model> {
    let genre = catalog_service::create_genre(db, "SciFi")
        .await
        .expect("Failed to create genre");
    let author = catalog_service::create_author(db, "Test Author", None)
        .await
        .expect("Failed to create author");
    let book = catalog_service::create_book(
        db,
        NewBook {
            title: "Test Book".to_string(),
            isbn: Some("TEST-123".to_string()),
            publication_year: Some(2024),
            genre_id: Some(genre.id),
            author_ids: vec![author.id],
        },
    )
    .await
    .expect("Failed to create book");

    let mut result = Vec::new();
    for i in 0..copies {
        result.push(
            catalog_service::add_copy(db, book.id, &format!("TEST-INV-{:03}", i))
                .await
                .expect("Failed to create copy"),
        );
    }
    result
}

async fn copy_status(db: &DatabaseConnection, copy_id: i32) -> CopyStatus {
    book_copy::Entity::find_by_id(copy_id)
        .one(db)
        .await
        .expect("DB error")
        .expect("Copy not found")
        .status
}

async fn outstanding_loans(db: &DatabaseConnection, copy_id: i32) -> u64 {
    loan::Entity::find()
        .filter(loan::Column::BookCopyId.eq(copy_id))
        .filter(loan::Column::ReturnedAt.is_null())
        .count(db)
        .await
        .expect("DB error")
}

#[tokio::test]
async fn test_borrow_then_return_lifecycle() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Ivan").await;

    let loan = lending_service::borrow(&db, copy.id, reader.id, lending_service::DEFAULT_LOAN_DAYS)
        .await
        .expect("Borrow failed");

    assert_eq!(loan.book_copy_id, copy.id);
    assert_eq!(loan.reader_id, reader.id);
    assert_eq!(loan.due_date, Local::now().date_naive() + Duration::days(14));
    assert!(loan.returned_at.is_none());
    assert_eq!(copy_status(&db, copy.id).await, CopyStatus::OnLoan);

    let returned = lending_service::return_copy(&db, copy.id)
        .await
        .expect("Return failed");

    assert_eq!(returned.id, loan.id);
    let returned_at = returned.returned_at.expect("returned_at should be set");
    assert!(returned_at >= returned.borrowed_at);
    assert_eq!(copy_status(&db, copy.id).await, CopyStatus::Available);
    assert_eq!(outstanding_loans(&db, copy.id).await, 0);
}

#[tokio::test]
async fn test_custom_loan_period() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Maria").await;

    let loan = lending_service::borrow(&db, copy.id, reader.id, 3)
        .await
        .expect("Borrow failed");

    assert_eq!(loan.due_date, Local::now().date_naive() + Duration::days(3));
}

#[tokio::test]
async fn test_second_borrow_fails_and_leaves_state_unchanged() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Ivan").await;

    lending_service::borrow(&db, copy.id, reader.id, 14)
        .await
        .expect("First borrow failed");
    let loans_before = loan::Entity::find().count(&db).await.expect("DB error");

    let err = lending_service::borrow(&db, copy.id, reader.id, 14)
        .await
        .expect_err("Second borrow should fail");

    match err {
        DomainError::InvalidState(msg) => assert!(msg.contains("on_loan"), "message: {}", msg),
        other => panic!("Expected InvalidState, got {:?}", other),
    }

    assert_eq!(loan::Entity::find().count(&db).await.expect("DB error"), loans_before);
    assert_eq!(copy_status(&db, copy.id).await, CopyStatus::OnLoan);
}

#[tokio::test]
async fn test_borrow_missing_copy_or_reader() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Ivan").await;

    let err = lending_service::borrow(&db, 999, reader.id, 14).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let err = lending_service::borrow(&db, copy.id, 999, 14).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    assert_eq!(copy_status(&db, copy.id).await, CopyStatus::Available);
    assert_eq!(loan::Entity::find().count(&db).await.expect("DB error"), 0);
}

#[tokio::test]
async fn test_borrow_refused_for_lost_and_maintenance_copies() {
    let db = setup_test_db().await;
    let copies = create_test_copies(&db, 2).await;
    let reader = create_test_reader(&db, "Ivan").await;

    lending_service::report_lost(&db, copies[0].id)
        .await
        .expect("Report lost failed");

    let mut in_repair: book_copy::ActiveModel = copies[1].clone().into();
    in_repair.status = Set(CopyStatus::Maintenance);
    in_repair.update(&db).await.expect("Update failed");

    let err = lending_service::borrow(&db, copies[0].id, reader.id, 14).await.unwrap_err();
    assert_eq!(
        err,
        DomainError::InvalidState(format!(
            "book copy {} is not available (status: lost)",
            copies[0].id
        ))
    );

    let err = lending_service::borrow(&db, copies[1].id, reader.id, 14).await.unwrap_err();
    match err {
        DomainError::InvalidState(msg) => assert!(msg.contains("maintenance")),
        other => panic!("Expected InvalidState, got {:?}", other),
    }
}

#[tokio::test]
async fn test_outstanding_loan_index_is_translated_to_invalid_state() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let first = create_test_reader(&db, "Ivan").await;
    let second = create_test_reader(&db, "Petro").await;

    lending_service::borrow(&db, copy.id, first.id, 14)
        .await
        .expect("Borrow failed");

    // Desynchronise the status so that only the storage constraint stands
    // between the copy and a second outstanding loan
    let mut desync: book_copy::ActiveModel = book_copy::Entity::find_by_id(copy.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap()
        .into();
    desync.status = Set(CopyStatus::Available);
    desync.update(&db).await.expect("Update failed");

    let err = lending_service::borrow(&db, copy.id, second.id, 14)
        .await
        .expect_err("Constraint should reject the loan");

    assert!(matches!(err, DomainError::InvalidState(_)), "got {:?}", err);
    assert_eq!(outstanding_loans(&db, copy.id).await, 1);
    assert_eq!(loan::Entity::find().count(&db).await.unwrap(), 1);
    // Rolled back: the status update was never applied
    assert_eq!(copy_status(&db, copy.id).await, CopyStatus::Available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_borrows_exactly_one_succeeds() {
    // File-backed so the two borrows run on separate pooled connections
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("race.db").display());
    let db = db::init_db(&url).await.expect("Failed to init DB");

    let copies = create_test_copies(&db, 20).await;
    let first = create_test_reader(&db, "Ivan").await;
    let second = create_test_reader(&db, "Maria").await;

    for copy in &copies {
        let (db_a, db_b) = (db.clone(), db.clone());
        let (copy_id, first_id, second_id) = (copy.id, first.id, second.id);

        let a = tokio::spawn(async move { lending_service::borrow(&db_a, copy_id, first_id, 14).await });
        let b = tokio::spawn(async move { lending_service::borrow(&db_b, copy_id, second_id, 14).await });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1, "copy {}", copy_id);

        let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(
            matches!(failure, DomainError::InvalidState(_)),
            "copy {}: {:?}",
            copy_id,
            failure
        );

        assert_eq!(outstanding_loans(&db, copy_id).await, 1);
        assert_eq!(copy_status(&db, copy_id).await, CopyStatus::OnLoan);
    }
}

#[tokio::test]
async fn test_borrow_with_out_of_range_period_is_rejected() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Ivan").await;

    let err = lending_service::borrow(&db, copy.id, reader.id, u32::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)), "got {:?}", err);

    assert_eq!(loan::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(copy_status(&db, copy.id).await, CopyStatus::Available);

    // The copy is still lendable with a sane period
    lending_service::borrow(&db, copy.id, reader.id, 14).await.unwrap();
}

#[tokio::test]
async fn test_return_without_outstanding_loan() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Ivan").await;

    let err = lending_service::return_copy(&db, copy.id).await.unwrap_err();
    match err {
        DomainError::InvalidState(msg) => assert!(msg.contains("available")),
        other => panic!("Expected InvalidState, got {:?}", other),
    }

    let err = lending_service::return_copy(&db, 999).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    // A closed loan cannot be returned twice
    lending_service::borrow(&db, copy.id, reader.id, 14).await.unwrap();
    lending_service::return_copy(&db, copy.id).await.unwrap();
    let err = lending_service::return_copy(&db, copy.id).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[tokio::test]
async fn test_repeated_borrow_return_cycles_keep_single_outstanding_loan() {
    let db = setup_test_db().await;
    let copy = create_test_copies(&db, 1).await.remove(0);
    let reader = create_test_reader(&db, "Ivan").await;

    for _ in 0..3 {
        lending_service::borrow(&db, copy.id, reader.id, 14).await.unwrap();
        assert_eq!(outstanding_loans(&db, copy.id).await, 1);
        lending_service::return_copy(&db, copy.id).await.unwrap();
        assert_eq!(outstanding_loans(&db, copy.id).await, 0);
    }

    assert_eq!(loan::Entity::find().count(&db).await.unwrap(), 3);
}

#[tokio::test]
async fn test_delete_reader_removes_history_and_releases_copies() {
    let db = setup_test_db().await;
    let copies = create_test_copies(&db, 3).await;
    let leaving = create_test_reader(&db, "Temp").await;
    let staying = create_test_reader(&db, "Maria").await;

    // Two returned loans and one outstanding for the leaving reader
    for copy in &copies[..2] {
        lending_service::borrow(&db, copy.id, leaving.id, 14).await.unwrap();
        lending_service::return_copy(&db, copy.id).await.unwrap();
    }
    lending_service::borrow(&db, copies[2].id, leaving.id, 14).await.unwrap();
    // One outstanding loan for a reader who stays
    lending_service::borrow(&db, copies[0].id, staying.id, 14).await.unwrap();

    let deletion = lending_service::delete_reader(&db, leaving.id)
        .await
        .expect("Delete failed");

    assert_eq!(deletion.reader_id, leaving.id);
    assert_eq!(deletion.name, "Temp Reader");
    assert_eq!(deletion.loans_deleted, 3);
    assert_eq!(deletion.copies_released, 1);

    assert!(reader::Entity::find_by_id(leaving.id).one(&db).await.unwrap().is_none());
    let remaining = loan::Entity::find()
        .filter(loan::Column::ReaderId.eq(leaving.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    assert_eq!(copy_status(&db, copies[2].id).await, CopyStatus::Available);
    assert_eq!(copy_status(&db, copies[0].id).await, CopyStatus::OnLoan);
    assert_eq!(loan::Entity::find().count(&db).await.unwrap(), 1);

    // The released copy can be lent again
    lending_service::borrow(&db, copies[2].id, staying.id, 14)
        .await
        .expect("Released copy should be borrowable");
}

#[tokio::test]
async fn test_delete_missing_reader() {
    let db = setup_test_db().await;

    let err = lending_service::delete_reader(&db, 42).await.unwrap_err();
    assert_eq!(err, DomainError::NotFound("reader 42 does not exist".to_string()));
}

#[tokio::test]
async fn test_report_lost_is_a_soft_delete() {
    let db = setup_test_db().await;
    let copies = create_test_copies(&db, 2).await;
    let reader = create_test_reader(&db, "Ivan").await;

    let lost = lending_service::report_lost(&db, copies[0].id)
        .await
        .expect("Report lost failed");
    assert_eq!(lost.status, CopyStatus::Lost);
    assert_eq!(lost.inventory_number, copies[0].inventory_number);

    // Regardless of prior status
    lending_service::borrow(&db, copies[1].id, reader.id, 14).await.unwrap();
    let lost = lending_service::report_lost(&db, copies[1].id).await.unwrap();
    assert_eq!(lost.status, CopyStatus::Lost);

    let still_there = book_copy::Entity::find_by_id(copies[0].id)
        .one(&db)
        .await
        .unwrap();
    assert_eq!(still_there.map(|c| c.status), Some(CopyStatus::Lost));

    let err = lending_service::report_lost(&db, 999).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}
