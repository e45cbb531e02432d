use chrono::{Duration, Local, Utc};
use sea_orm::*;

use crate::domain::DomainError;
use crate::models::{author, book, book_authors, book_copy, genre, loan, reader, CopyStatus};
use crate::models::reader::NewReader;
use crate::services::catalog_service::{self, NewBook};

/// Wipe every lending table and load a small demo library: four genres,
/// five authors, four books with three copies each, three readers, one
/// returned loan and one outstanding loan.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DomainError> {
    // 1. Clear old data, children first, all or nothing
    let txn = db.begin().await?;
    loan::Entity::delete_many().exec(&txn).await?;
    book_copy::Entity::delete_many().exec(&txn).await?;
    book_authors::Entity::delete_many().exec(&txn).await?;
    book::Entity::delete_many().exec(&txn).await?;
    author::Entity::delete_many().exec(&txn).await?;
    genre::Entity::delete_many().exec(&txn).await?;
    reader::Entity::delete_many().exec(&txn).await?;
    txn.commit().await?;

    // 2. Genres
    let mut genres = Vec::new();
    for name in ["Science Fiction", "Detective", "Classics", "Popular Science"] {
        genres.push(catalog_service::create_genre(db, name).await?);
    }

    // 3. Authors
    let orwell = catalog_service::create_author(db, "George Orwell", Some("Dystopian novelist")).await?;
    let rowling = catalog_service::create_author(db, "J.K. Rowling", Some("Harry Potter")).await?;
    let pratchett = catalog_service::create_author(db, "Terry Pratchett", Some("Satirical fantasy")).await?;
    let gaiman = catalog_service::create_author(db, "Neil Gaiman", Some("Fantasy")).await?;
    let king = catalog_service::create_author(db, "Stephen King", Some("King of horror")).await?;

    // 4. Books
    let books = [
        ("1984", 1949, 0, vec![orwell.id], "978-0451524935"),
        (
            "Harry Potter and the Philosopher's Stone",
            1997,
            0,
            vec![rowling.id],
            "978-0747532699",
        ),
        ("Good Omens", 1990, 0, vec![pratchett.id, gaiman.id], "978-0060853983"),
        ("The Shining", 1977, 1, vec![king.id], "978-0307743657"),
    ];

    let mut copies = Vec::new();
    for (title, year, genre_idx, author_ids, isbn) in books {
        let book = catalog_service::create_book(
            db,
            NewBook {
                title: title.to_owned(),
                isbn: Some(isbn.to_owned()),
                publication_year: Some(year),
                genre_id: Some(genres[genre_idx].id),
                author_ids,
            },
        )
        .await?;

        // 5. Three copies per book
        for i in 0..3 {
            let inventory_number = format!("INV-{}-{}", book.id, i + 100);
            copies.push(catalog_service::add_copy(db, book.id, &inventory_number).await?);
        }
    }

    // 6. Readers
    let mut readers = Vec::new();
    for (first, last, email, phone) in [
        ("Ivan", "Testenko", "ivan@test.com", Some("+380501112233")),
        ("Maria", "Bookworm", "maria@test.com", Some("+380971112233")),
        ("Petro", "Student", "petro@test.com", None),
    ] {
        readers.push(
            catalog_service::register_reader(
                db,
                NewReader {
                    first_name: first.to_owned(),
                    last_name: last.to_owned(),
                    email: email.to_owned(),
                    phone_number: phone.map(str::to_owned),
                },
            )
            .await?,
        );
    }

    // 7. Loan history: one returned, one still out
    let now = Local::now();
    let txn = db.begin().await?;

    loan::ActiveModel {
        borrowed_at: Set((now - Duration::days(10)).with_timezone(&Utc)),
        due_date: Set(now.date_naive() + Duration::days(20)),
        returned_at: Set(Some(now.with_timezone(&Utc))),
        book_copy_id: Set(copies[0].id),
        reader_id: Set(readers[0].id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    loan::ActiveModel {
        borrowed_at: Set((now - Duration::days(2)).with_timezone(&Utc)),
        due_date: Set(now.date_naive() + Duration::days(12)),
        returned_at: Set(None),
        book_copy_id: Set(copies[1].id),
        reader_id: Set(readers[1].id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut active_copy: book_copy::ActiveModel = copies[1].clone().into();
    active_copy.status = Set(CopyStatus::OnLoan);
    active_copy.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        books = 4,
        copies = copies.len(),
        readers = readers.len(),
        "Demo data seeded"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::services::analytics_service;

    #[tokio::test]
    async fn test_seed_is_repeatable_and_consistent() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");

        seed_demo_data(&db).await.expect("First seed failed");
        seed_demo_data(&db).await.expect("Second seed failed");

        let copies = book_copy::Entity::find().all(&db).await.expect("DB error");
        assert_eq!(copies.len(), 12);

        let on_loan: Vec<_> = copies
            .iter()
            .filter(|c| c.status == CopyStatus::OnLoan)
            .collect();
        assert_eq!(on_loan.len(), 1);

        let outstanding = loan::Entity::find()
            .filter(loan::Column::ReturnedAt.is_null())
            .all(&db)
            .await
            .expect("DB error");
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].book_copy_id, on_loan[0].id);

        let scifi = analytics_service::books_by_genre(&db, "Science Fiction")
            .await
            .expect("Query failed");
        let titles: Vec<&str> = scifi.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Harry Potter and the Philosopher's Stone", "Good Omens", "1984"]
        );
        assert_eq!(scifi[1].authors, vec!["Terry Pratchett", "Neil Gaiman"]);
    }

    #[tokio::test]
    async fn test_failed_wipe_leaves_existing_data() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        seed_demo_data(&db).await.expect("Seed failed");

        // Readers are deleted last, so this aborts after every other table was cleared
        db.execute_unprepared(
            "CREATE TRIGGER block_reader_delete BEFORE DELETE ON readers \
             BEGIN SELECT RAISE(ABORT, 'readers are locked'); END",
        )
        .await
        .expect("Failed to create trigger");

        let err = seed_demo_data(&db).await.unwrap_err();
        assert!(matches!(err, DomainError::Database(_)), "got {:?}", err);

        assert_eq!(loan::Entity::find().count(&db).await.expect("DB error"), 2);
        assert_eq!(book_copy::Entity::find().count(&db).await.expect("DB error"), 12);
        assert_eq!(book::Entity::find().count(&db).await.expect("DB error"), 4);
        assert_eq!(genre::Entity::find().count(&db).await.expect("DB error"), 4);
    }
}
