//! Lending Service - borrow, return, reader removal and loss reports
//!
//! Each operation validates its preconditions and applies all of its writes
//! inside one transaction. Returning early with an error drops the
//! transaction, which rolls it back, so a failed call leaves no trace.

use chrono::{Days, Local, Utc};
use sea_orm::*;
use serde::Serialize;

use crate::domain::DomainError;
use crate::models::book_copy::{self, CopyStatus, Entity as BookCopy};
use crate::models::loan::{self, Entity as Loan};
use crate::models::reader::Entity as Reader;

/// Loan period applied when the caller does not choose one
pub const DEFAULT_LOAN_DAYS: u32 = 14;

/// Audit summary of a reader hard-delete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReaderDeletion {
    pub reader_id: i32,
    pub name: String,
    pub loans_deleted: u64,
    /// Copies that were on loan to the reader and are back on the shelf
    pub copies_released: u64,
}

fn copy_not_found(copy_id: i32) -> DomainError {
    DomainError::NotFound(format!("book copy {} does not exist", copy_id))
}

fn reader_not_found(reader_id: i32) -> DomainError {
    DomainError::NotFound(format!("reader {} does not exist", reader_id))
}

fn copy_unavailable(copy_id: i32, status: CopyStatus) -> DomainError {
    DomainError::InvalidState(format!(
        "book copy {} is not available (status: {})",
        copy_id, status
    ))
}

/// Lend a copy to a reader for `loan_period_days` days
pub async fn borrow(
    db: &DatabaseConnection,
    copy_id: i32,
    reader_id: i32,
    loan_period_days: u32,
) -> Result<loan::Model, DomainError> {
    let txn = db.begin().await?;

    // 1. Check that copy and reader exist and the copy is on the shelf
    let copy = BookCopy::find_by_id(copy_id)
        .one(&txn)
        .await?
        .ok_or_else(|| copy_not_found(copy_id))?;

    let reader = Reader::find_by_id(reader_id)
        .one(&txn)
        .await?
        .ok_or_else(|| reader_not_found(reader_id))?;

    if copy.status != CopyStatus::Available {
        tracing::warn!(
            copy_id,
            reader_id,
            status = %copy.status,
            "Borrow refused: copy is not available"
        );
        return Err(copy_unavailable(copy_id, copy.status));
    }

    let now = Local::now();
    let due_date = now
        .date_naive()
        .checked_add_days(Days::new(u64::from(loan_period_days)))
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "loan period of {} days is out of range",
                loan_period_days
            ))
        })?;

    // 2. Create Loan. The partial unique index rejects a second outstanding
    // loan even if another caller slipped in after the check above.
    let new_loan = loan::ActiveModel {
        borrowed_at: Set(now.with_timezone(&Utc)),
        due_date: Set(due_date),
        returned_at: Set(None),
        book_copy_id: Set(copy.id),
        reader_id: Set(reader.id),
        ..Default::default()
    };

    let saved_loan = new_loan.insert(&txn).await.map_err(|e| {
        DomainError::from_constraint(e, |detail| {
            tracing::warn!(copy_id, detail, "Borrow lost a race on the outstanding-loan index");
            DomainError::InvalidState(format!(
                "book copy {} already has an outstanding loan (status: {})",
                copy_id,
                CopyStatus::OnLoan
            ))
        })
    })?;

    // 3. Update copy status to 'on_loan', guarded on it still being available
    let updated = BookCopy::update_many()
        .set(book_copy::ActiveModel {
            status: Set(CopyStatus::OnLoan),
            ..Default::default()
        })
        .filter(book_copy::Column::Id.eq(copy.id))
        .filter(book_copy::Column::Status.eq(CopyStatus::Available))
        .exec(&txn)
        .await?;

    if updated.rows_affected != 1 {
        let current = BookCopy::find_by_id(copy.id)
            .one(&txn)
            .await?
            .map(|c| c.status)
            .unwrap_or(CopyStatus::OnLoan);
        return Err(copy_unavailable(copy_id, current));
    }

    txn.commit().await?;

    tracing::info!(
        loan_id = saved_loan.id,
        copy_id,
        reader_id,
        due_date = %saved_loan.due_date,
        "Copy lent to {}",
        reader.full_name()
    );

    Ok(saved_loan)
}

/// Close the outstanding loan of a copy and put the copy back on the shelf
pub async fn return_copy(db: &DatabaseConnection, copy_id: i32) -> Result<loan::Model, DomainError> {
    let txn = db.begin().await?;

    let copy = BookCopy::find_by_id(copy_id)
        .one(&txn)
        .await?
        .ok_or_else(|| copy_not_found(copy_id))?;

    // 1. Find the outstanding loan
    let loan = Loan::find()
        .filter(loan::Column::BookCopyId.eq(copy_id))
        .filter(loan::Column::ReturnedAt.is_null())
        .one(&txn)
        .await?
        .ok_or_else(|| {
            tracing::warn!(copy_id, status = %copy.status, "Return refused: no outstanding loan");
            DomainError::InvalidState(format!(
                "book copy {} has no outstanding loan (status: {})",
                copy_id, copy.status
            ))
        })?;

    // 2. Close the loan
    let mut loan_active: loan::ActiveModel = loan.into();
    loan_active.returned_at = Set(Some(Utc::now()));
    let returned_loan = loan_active.update(&txn).await?;

    // 3. Update copy status to 'available'
    let mut copy_active: book_copy::ActiveModel = copy.into();
    copy_active.status = Set(CopyStatus::Available);
    copy_active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(loan_id = returned_loan.id, copy_id, "Copy returned");

    Ok(returned_loan)
}

/// Hard-delete a reader together with their whole loan history.
///
/// Copies still out with the reader are set back to `available` in the same
/// transaction so that `on_loan` keeps meaning "has an outstanding loan".
pub async fn delete_reader(
    db: &DatabaseConnection,
    reader_id: i32,
) -> Result<ReaderDeletion, DomainError> {
    let txn = db.begin().await?;

    let reader = Reader::find_by_id(reader_id)
        .one(&txn)
        .await?
        .ok_or_else(|| reader_not_found(reader_id))?;

    let loans = Loan::find()
        .filter(loan::Column::ReaderId.eq(reader_id))
        .all(&txn)
        .await?;

    let outstanding_copies: Vec<i32> = loans
        .iter()
        .filter(|l| l.is_outstanding())
        .map(|l| l.book_copy_id)
        .collect();

    let copies_released = if outstanding_copies.is_empty() {
        0
    } else {
        BookCopy::update_many()
            .set(book_copy::ActiveModel {
                status: Set(CopyStatus::Available),
                ..Default::default()
            })
            .filter(book_copy::Column::Id.is_in(outstanding_copies))
            .filter(book_copy::Column::Status.eq(CopyStatus::OnLoan))
            .exec(&txn)
            .await?
            .rows_affected
    };

    let deleted = Loan::delete_many()
        .filter(loan::Column::ReaderId.eq(reader_id))
        .exec(&txn)
        .await?;

    Reader::delete_by_id(reader_id).exec(&txn).await?;

    txn.commit().await?;

    let name = reader.full_name();
    tracing::info!(
        reader_id,
        loans_deleted = deleted.rows_affected,
        copies_released,
        "Reader '{}' deleted with their loan history",
        name
    );

    Ok(ReaderDeletion {
        reader_id,
        name,
        loans_deleted: loans.len() as u64,
        copies_released,
    })
}

/// Write a copy off as lost. The record stays in place (soft delete).
pub async fn report_lost(db: &DatabaseConnection, copy_id: i32) -> Result<book_copy::Model, DomainError> {
    let txn = db.begin().await?;

    let copy = BookCopy::find_by_id(copy_id)
        .one(&txn)
        .await?
        .ok_or_else(|| copy_not_found(copy_id))?;

    let previous = copy.status;
    let mut copy_active: book_copy::ActiveModel = copy.into();
    copy_active.status = Set(CopyStatus::Lost);
    let lost = copy_active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(copy_id, previous = %previous, "Copy reported lost");

    Ok(lost)
}
