pub mod author;
pub mod book;
pub mod book_authors;
pub mod book_copy;
pub mod genre;
pub mod loan;
pub mod reader;

pub use book_copy::CopyStatus;
