//! Scripted walk through the lending workflow, run with `--demo`.
//!
//! Expects seeded data (`SEED_DEMO=1`) and fails with `NotFound` without it.
//! Each step logs what happened; an expected refusal is logged as such
//! rather than aborting the run.

use chrono::{Duration, Local, Utc};
use sea_orm::*;

use crate::domain::DomainError;
use crate::models::book_copy::{self, CopyStatus, Entity as BookCopy};
use crate::models::loan;
use crate::models::reader::{Entity as Reader, NewReader};
use crate::services::{analytics_service, catalog_service, lending_service};

pub async fn run_demo(db: &DatabaseConnection) -> Result<(), DomainError> {
    let copy = BookCopy::find()
        .filter(book_copy::Column::Status.eq(CopyStatus::Available))
        .one(db)
        .await?
        .ok_or_else(|| {
            DomainError::NotFound("no available book copy; run with SEED_DEMO=1 first".to_string())
        })?;
    let reader = Reader::find()
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("no reader; run with SEED_DEMO=1 first".to_string()))?;

    tracing::info!(copy_id = copy.id, reader = %reader.full_name(), "Demo copy and reader");

    // Scenario 1: lend the copy
    lending_service::borrow(db, copy.id, reader.id, lending_service::DEFAULT_LOAN_DAYS).await?;

    // Scenario 2: a second borrow of the same copy must be refused
    match lending_service::borrow(db, copy.id, reader.id, lending_service::DEFAULT_LOAN_DAYS).await {
        Err(DomainError::InvalidState(msg)) => tracing::info!("Double borrow refused: {}", msg),
        Err(e) => return Err(e),
        Ok(loan) => tracing::error!(loan_id = loan.id, "Double borrow was accepted"),
    }

    // Scenario 3: give it back
    lending_service::return_copy(db, copy.id).await?;

    // Analytics, with an artificial debtor so the overdue report has content
    let now = Local::now();
    let txn = db.begin().await?;
    let overdue = loan::ActiveModel {
        borrowed_at: Set((now - Duration::days(100)).with_timezone(&Utc)),
        due_date: Set(now.date_naive() - Duration::days(80)),
        returned_at: Set(None),
        book_copy_id: Set(copy.id),
        reader_id: Set(reader.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let mut copy_active: book_copy::ActiveModel = copy.clone().into();
    copy_active.status = Set(CopyStatus::OnLoan);
    copy_active.update(&txn).await?;
    txn.commit().await?;

    for book in analytics_service::books_by_genre(db, "Science Fiction").await? {
        tracing::info!(
            "{} ({}) - {}",
            book.title,
            book.year.map(|y| y.to_string()).unwrap_or_else(|| "n/a".to_string()),
            book.authors.join(", ")
        );
    }
    for late in analytics_service::overdue_loans(db).await? {
        tracing::info!("{}: '{}' is {} days late", late.reader, late.title, late.days_late);
    }
    for (i, top) in analytics_service::top_readers(db, analytics_service::DEFAULT_TOP_READERS)
        .await?
        .into_iter()
        .enumerate()
    {
        tracing::info!("{}. {} {} - {} loans", i + 1, top.first_name, top.last_name, top.loan_count);
    }
    for genre in analytics_service::genre_popularity(db).await? {
        tracing::info!("{}: lent {} times", genre.genre, genre.loan_count);
    }
    for ranked in analytics_service::reader_ranks(db).await? {
        tracing::info!(
            "#{} {} {} ({} loans)",
            ranked.rank,
            ranked.first_name,
            ranked.last_name,
            ranked.loan_count
        );
    }

    // Undo the artificial debtor
    lending_service::return_copy(db, copy.id).await?;
    loan::Entity::delete_by_id(overdue.id).exec(db).await?;

    // Scenario 4: hard delete of a reader with an outstanding loan
    let temp_reader = catalog_service::register_reader(
        db,
        NewReader {
            first_name: "Temp".to_owned(),
            last_name: "DeleteMe".to_owned(),
            email: format!("temp-{}@del.com", now.timestamp()),
            phone_number: None,
        },
    )
    .await?;
    lending_service::borrow(db, copy.id, temp_reader.id, lending_service::DEFAULT_LOAN_DAYS).await?;
    let deletion = lending_service::delete_reader(db, temp_reader.id).await?;
    tracing::info!(
        "Deleted '{}' with {} loans, {} copies back on the shelf",
        deletion.name,
        deletion.loans_deleted,
        deletion.copies_released
    );

    // Scenario 5: write the copy off (soft delete)
    let lost = lending_service::report_lost(db, copy.id).await?;
    tracing::info!(copy_id = lost.id, status = %lost.status, "Copy kept in the catalog as lost");

    tracing::info!("Demonstration finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::seed::seed_demo_data;

    #[tokio::test]
    async fn test_demo_requires_seeded_data() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");

        let err = run_demo(&db).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_demo_runs_on_seeded_data() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        seed_demo_data(&db).await.expect("Seed failed");

        run_demo(&db).await.expect("Demo failed");

        let lost = BookCopy::find()
            .filter(book_copy::Column::Status.eq(CopyStatus::Lost))
            .count(&db)
            .await
            .expect("DB error");
        assert_eq!(lost, 1);
    }
}
