//! Catalog Service - administrative creation and removal of genres, authors,
//! books, copies and readers
//!
//! Lending never goes through here; the seeder, the demo run, the HTTP layer
//! and the tests use these helpers to put records in place.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::domain::DomainError;
use crate::models::author;
use crate::models::book::{self, Entity as Book};
use crate::models::book_authors::{self, Entity as BookAuthors};
use crate::models::book_copy::{self, CopyStatus, Entity as BookCopy};
use crate::models::genre::{self, Entity as Genre};
use crate::models::loan::{self, Entity as Loan};
use crate::models::reader::{self, Entity as Reader, NewReader};

/// Input for creating a book
#[derive(Debug, Default, Clone)]
pub struct NewBook {
    pub title: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre_id: Option<i32>,
    /// Authors in display order
    pub author_ids: Vec<i32>,
}

fn duplicate(what: &str, value: &str) -> impl FnOnce(&str) -> DomainError {
    let msg = format!("{} '{}' already exists", what, value);
    move |_| DomainError::Validation(msg)
}

pub async fn create_genre(db: &DatabaseConnection, name: &str) -> Result<genre::Model, DomainError> {
    genre::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::from_constraint(e, duplicate("genre", name)))
}

pub async fn create_author(
    db: &DatabaseConnection,
    full_name: &str,
    bio: Option<&str>,
) -> Result<author::Model, DomainError> {
    let author = author::ActiveModel {
        full_name: Set(full_name.to_owned()),
        bio: Set(bio.map(str::to_owned)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(author)
}

/// Create a book and attach its authors in the given order
pub async fn create_book(db: &DatabaseConnection, input: NewBook) -> Result<book::Model, DomainError> {
    if let Some(year) = input.publication_year
        && year <= 0
    {
        return Err(DomainError::Validation(format!(
            "publication year must be positive, got {}",
            year
        )));
    }

    let txn = db.begin().await?;

    let isbn_label = input.isbn.clone().unwrap_or_default();
    let book = book::ActiveModel {
        title: Set(input.title),
        isbn: Set(input.isbn),
        publication_year: Set(input.publication_year),
        genre_id: Set(input.genre_id),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| DomainError::from_constraint(e, duplicate("book isbn", &isbn_label)))?;

    for (position, author_id) in input.author_ids.into_iter().enumerate() {
        book_authors::ActiveModel {
            book_id: Set(book.id),
            author_id: Set(author_id),
            position: Set(position as i32),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            DomainError::from_constraint(e, |_| {
                DomainError::Validation(format!(
                    "author {} is missing or already attached to book {}",
                    author_id, book.id
                ))
            })
        })?;
    }

    txn.commit().await?;
    Ok(book)
}

/// Register a new physical copy of a book, on the shelf
pub async fn add_copy(
    db: &DatabaseConnection,
    book_id: i32,
    inventory_number: &str,
) -> Result<book_copy::Model, DomainError> {
    if Book::find_by_id(book_id).one(db).await?.is_none() {
        return Err(DomainError::NotFound(format!("book {} does not exist", book_id)));
    }

    book_copy::ActiveModel {
        inventory_number: Set(inventory_number.to_owned()),
        status: Set(CopyStatus::Available),
        book_id: Set(book_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::from_constraint(e, duplicate("inventory number", inventory_number)))
}

pub async fn register_reader(
    db: &DatabaseConnection,
    input: NewReader,
) -> Result<reader::Model, DomainError> {
    let email = input.email.clone();
    reader::ActiveModel {
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        phone_number: Set(input.phone_number),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| DomainError::from_constraint(e, duplicate("reader email", &email)))
}

pub async fn get_copy(db: &DatabaseConnection, copy_id: i32) -> Result<book_copy::Model, DomainError> {
    BookCopy::find_by_id(copy_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("book copy {} does not exist", copy_id)))
}

pub async fn get_reader(db: &DatabaseConnection, reader_id: i32) -> Result<reader::Model, DomainError> {
    Reader::find_by_id(reader_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("reader {} does not exist", reader_id)))
}

/// Remove a genre. Its books stay in the catalog without a genre.
pub async fn delete_genre(db: &DatabaseConnection, genre_id: i32) -> Result<u64, DomainError> {
    let txn = db.begin().await?;

    if Genre::find_by_id(genre_id).one(&txn).await?.is_none() {
        return Err(DomainError::NotFound(format!("genre {} does not exist", genre_id)));
    }

    let detached = Book::update_many()
        .set(book::ActiveModel {
            genre_id: Set(None),
            ..Default::default()
        })
        .filter(book::Column::GenreId.eq(genre_id))
        .exec(&txn)
        .await?
        .rows_affected;

    Genre::delete_by_id(genre_id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(genre_id, detached, "Genre deleted");
    Ok(detached)
}

/// Remove a book with its copies, their loan history and its author links
pub async fn delete_book(db: &DatabaseConnection, book_id: i32) -> Result<(), DomainError> {
    let txn = db.begin().await?;

    if Book::find_by_id(book_id).one(&txn).await?.is_none() {
        return Err(DomainError::NotFound(format!("book {} does not exist", book_id)));
    }

    let copy_ids: Vec<i32> = BookCopy::find()
        .filter(book_copy::Column::BookId.eq(book_id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    if !copy_ids.is_empty() {
        Loan::delete_many()
            .filter(loan::Column::BookCopyId.is_in(copy_ids))
            .exec(&txn)
            .await?;
    }

    BookCopy::delete_many()
        .filter(book_copy::Column::BookId.eq(book_id))
        .exec(&txn)
        .await?;
    BookAuthors::delete_many()
        .filter(book_authors::Column::BookId.eq(book_id))
        .exec(&txn)
        .await?;
    Book::delete_by_id(book_id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(book_id, "Book deleted with its copies");
    Ok(())
}
