//! Analytics Service - read-only reports over the lending history
//!
//! Grouping and counting happen in SQL; ordering, tie-breaking and ranking
//! are done here so the results do not depend on backend-specific window
//! functions.

use chrono::{Local, NaiveDate};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::domain::DomainError;
use crate::models::author::Entity as Author;
use crate::models::book::{self, Entity as Book};
use crate::models::book_authors::{self, Entity as BookAuthors};
use crate::models::book_copy::{self, Entity as BookCopy};
use crate::models::genre::{self, Entity as Genre};
use crate::models::loan::{self, Entity as Loan};
use crate::models::reader::{self, Entity as Reader};

/// Row cap of `top_readers` when the caller gives none
pub const DEFAULT_TOP_READERS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreBook {
    pub title: String,
    pub year: Option<i32>,
    /// Author full names, in the order they were attached to the book
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OverdueLoan {
    pub loan_id: i32,
    pub reader: String,
    pub title: String,
    pub due_date: NaiveDate,
    pub days_late: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReaderLoanCount {
    pub reader_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub loan_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GenreLoanCount {
    pub genre: String,
    pub loan_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReaderRank {
    pub reader_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub loan_count: i64,
    pub rank: u64,
}

#[derive(Debug, FromQueryResult)]
struct ReaderCountRow {
    reader_id: i32,
    first_name: String,
    last_name: String,
    loan_count: i64,
}

#[derive(Debug, FromQueryResult)]
struct GenreCountRow {
    genre: String,
    loan_count: i64,
}

/// Books of the genre named exactly `genre_name`, newest first.
///
/// Books without a publication year come last; equal years are ordered by
/// title, then id. An unknown genre yields an empty list.
pub async fn books_by_genre(
    db: &DatabaseConnection,
    genre_name: &str,
) -> Result<Vec<GenreBook>, DomainError> {
    let mut books = Book::find()
        .inner_join(Genre)
        .filter(genre::Column::Name.eq(genre_name))
        .all(db)
        .await?;

    books.sort_by(|a, b| {
        // Option orders None first, so reversing puts missing years last
        b.publication_year
            .cmp(&a.publication_year)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    });

    let book_ids: Vec<i32> = books.iter().map(|b| b.id).collect();
    let mut authors_by_book: HashMap<i32, Vec<String>> = HashMap::new();

    if !book_ids.is_empty() {
        let links = BookAuthors::find()
            .filter(book_authors::Column::BookId.is_in(book_ids))
            .order_by_asc(book_authors::Column::BookId)
            .order_by_asc(book_authors::Column::Position)
            .find_also_related(Author)
            .all(db)
            .await?;

        for (link, author) in links {
            if let Some(author) = author {
                authors_by_book
                    .entry(link.book_id)
                    .or_default()
                    .push(author.full_name);
            }
        }
    }

    tracing::debug!(genre = genre_name, count = books.len(), "Books by genre");

    Ok(books
        .into_iter()
        .map(|b| GenreBook {
            authors: authors_by_book.remove(&b.id).unwrap_or_default(),
            title: b.title,
            year: b.publication_year,
        })
        .collect())
}

/// Outstanding loans past their due date, as of the local calendar date
pub async fn overdue_loans(db: &DatabaseConnection) -> Result<Vec<OverdueLoan>, DomainError> {
    overdue_loans_on(db, Local::now().date_naive()).await
}

/// Outstanding loans whose due date is strictly before `today`, most late first
pub async fn overdue_loans_on(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Vec<OverdueLoan>, DomainError> {
    let loans_with_readers = Loan::find()
        .filter(loan::Column::ReturnedAt.is_null())
        .filter(loan::Column::DueDate.lt(today))
        .find_also_related(Reader)
        .all(db)
        .await?;

    // Collect copy IDs to fetch book titles
    let copy_ids: Vec<i32> = loans_with_readers
        .iter()
        .map(|(l, _)| l.book_copy_id)
        .collect();
    let mut copy_title_map: HashMap<i32, String> = HashMap::new();

    if !copy_ids.is_empty() {
        let copies_with_books = BookCopy::find()
            .filter(book_copy::Column::Id.is_in(copy_ids))
            .find_also_related(Book)
            .all(db)
            .await?;

        for (copy, book) in copies_with_books {
            if let Some(book) = book {
                copy_title_map.insert(copy.id, book.title);
            }
        }
    }

    let mut overdue: Vec<OverdueLoan> = loans_with_readers
        .into_iter()
        .map(|(loan, reader)| OverdueLoan {
            loan_id: loan.id,
            reader: reader
                .map(|r| r.full_name())
                .unwrap_or_else(|| "Unknown".to_string()),
            title: copy_title_map
                .get(&loan.book_copy_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".to_string()),
            due_date: loan.due_date,
            days_late: (today - loan.due_date).num_days(),
        })
        .collect();

    overdue.sort_by(|a, b| {
        b.days_late
            .cmp(&a.days_late)
            .then_with(|| a.loan_id.cmp(&b.loan_id))
    });

    tracing::debug!(%today, count = overdue.len(), "Overdue loans");

    Ok(overdue)
}

/// Loan count per reader over the whole history, returned and outstanding
/// alike. Sorted by count descending, then reader id ascending. Readers
/// without any loan do not appear.
async fn reader_loan_counts(db: &DatabaseConnection) -> Result<Vec<ReaderLoanCount>, DomainError> {
    let rows = Loan::find()
        .select_only()
        .column(loan::Column::ReaderId)
        .column(reader::Column::FirstName)
        .column(reader::Column::LastName)
        .column_as(Expr::col((loan::Entity, loan::Column::Id)).count(), "loan_count")
        .join(JoinType::InnerJoin, loan::Relation::Reader.def())
        .group_by(loan::Column::ReaderId)
        .group_by(reader::Column::FirstName)
        .group_by(reader::Column::LastName)
        .into_model::<ReaderCountRow>()
        .all(db)
        .await?;

    let mut counts: Vec<ReaderLoanCount> = rows
        .into_iter()
        .map(|r| ReaderLoanCount {
            reader_id: r.reader_id,
            first_name: r.first_name,
            last_name: r.last_name,
            loan_count: r.loan_count,
        })
        .collect();

    counts.sort_by(|a, b| {
        b.loan_count
            .cmp(&a.loan_count)
            .then_with(|| a.reader_id.cmp(&b.reader_id))
    });

    Ok(counts)
}

/// The `limit` readers with the most loans
pub async fn top_readers(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<ReaderLoanCount>, DomainError> {
    let mut counts = reader_loan_counts(db).await?;
    counts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    Ok(counts)
}

/// Loans per genre, most borrowed first. Genres whose books were never lent
/// are left out.
pub async fn genre_popularity(db: &DatabaseConnection) -> Result<Vec<GenreLoanCount>, DomainError> {
    let rows = Loan::find()
        .select_only()
        .column_as(genre::Column::Name, "genre")
        .column_as(Expr::col((loan::Entity, loan::Column::Id)).count(), "loan_count")
        .join(JoinType::InnerJoin, loan::Relation::BookCopy.def())
        .join(JoinType::InnerJoin, book_copy::Relation::Book.def())
        .join(JoinType::InnerJoin, book::Relation::Genre.def())
        .group_by(genre::Column::Id)
        .group_by(genre::Column::Name)
        .into_model::<GenreCountRow>()
        .all(db)
        .await?;

    let mut popularity: Vec<GenreLoanCount> = rows
        .into_iter()
        .map(|r| GenreLoanCount {
            genre: r.genre,
            loan_count: r.loan_count,
        })
        .collect();

    popularity.sort_by(|a, b| {
        b.loan_count
            .cmp(&a.loan_count)
            .then_with(|| a.genre.cmp(&b.genre))
    });

    Ok(popularity)
}

/// Every reader with at least one loan, ranked by loan count
pub async fn reader_ranks(db: &DatabaseConnection) -> Result<Vec<ReaderRank>, DomainError> {
    let counts = reader_loan_counts(db).await?;
    Ok(assign_ranks(counts))
}

/// Standard competition ranking over counts sorted descending: tied readers
/// share a rank and the following rank skips the tied positions, so
/// `rank = 1 + number of readers with a strictly greater count`.
fn assign_ranks(counts: Vec<ReaderLoanCount>) -> Vec<ReaderRank> {
    let mut ranked = Vec::with_capacity(counts.len());
    let mut rank = 0;
    let mut previous: Option<i64> = None;

    for (position, entry) in counts.into_iter().enumerate() {
        if previous != Some(entry.loan_count) {
            rank = position as u64 + 1;
            previous = Some(entry.loan_count);
        }
        ranked.push(ReaderRank {
            reader_id: entry.reader_id,
            first_name: entry.first_name,
            last_name: entry.last_name,
            loan_count: entry.loan_count,
            rank,
        });
    }

    ranked
}
