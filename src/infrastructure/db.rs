use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_owned()))
        .await?;
    Ok(())
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Foreign keys are off by default on some SQLite builds
    execute(db, "PRAGMA foreign_keys = ON").await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS genres (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS authors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            full_name TEXT NOT NULL,
            bio TEXT
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            isbn TEXT UNIQUE,
            publication_year INTEGER,
            genre_id INTEGER,
            FOREIGN KEY (genre_id) REFERENCES genres(id) ON DELETE SET NULL,
            CONSTRAINT ck_book_pub_year_positive
                CHECK (publication_year IS NULL OR publication_year > 0)
        )
        "#,
    )
    .await?;

    execute(db, "CREATE INDEX IF NOT EXISTS ix_books_title ON books(title)").await?;
    execute(db, "CREATE INDEX IF NOT EXISTS ix_books_genre_id ON books(genre_id)").await?;

    // Create book_authors junction table
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS book_authors (
            book_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (book_id, author_id),
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE,
            FOREIGN KEY (author_id) REFERENCES authors(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS book_copies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            inventory_number TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'available'
                CHECK (status IN ('available', 'on_loan', 'lost', 'maintenance')),
            book_id INTEGER NOT NULL,
            FOREIGN KEY (book_id) REFERENCES books(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;

    execute(
        db,
        "CREATE INDEX IF NOT EXISTS ix_book_copies_status ON book_copies(status)",
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS readers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone_number TEXT
        )
        "#,
    )
    .await?;

    execute(db, "CREATE INDEX IF NOT EXISTS ix_readers_email ON readers(email)").await?;

    // Timestamps are stored as RFC 3339 UTC text so that the CHECK below
    // compares them chronologically.
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS loans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            borrowed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S+00:00', 'now')),
            due_date TEXT NOT NULL,
            returned_at TEXT,
            book_copy_id INTEGER NOT NULL,
            reader_id INTEGER NOT NULL,
            FOREIGN KEY (book_copy_id) REFERENCES book_copies(id) ON DELETE CASCADE,
            FOREIGN KEY (reader_id) REFERENCES readers(id) ON DELETE CASCADE,
            CONSTRAINT ck_loan_returned_after_borrowed
                CHECK (returned_at IS NULL OR returned_at >= borrowed_at)
        )
        "#,
    )
    .await?;

    execute(db, "CREATE INDEX IF NOT EXISTS ix_loans_reader_id ON loans(reader_id)").await?;

    // At most one outstanding loan per copy
    execute(
        db,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS ux_loans_active_per_copy
            ON loans(book_copy_id) WHERE returned_at IS NULL
        "#,
    )
    .await?;

    tracing::debug!("Database migrations applied");

    Ok(())
}
