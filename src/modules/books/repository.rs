use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_http::AppError;
use sqlx::SqlitePool;

use super::models::{Book, NewBook};

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;

/// Repository handle shared by the handlers.
pub type SharedBookRepository = Arc<dyn BookRepository>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("book record {0} does not exist")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => {
                AppError::not_found(format!("Not found book record with id = {}", id))
            }
            other => AppError::internal(other),
        }
    }
}

/// Persistence boundary for book records.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All records in storage order (ascending id).
    async fn find_all(&self) -> Result<Vec<Book>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>>;

    /// Insert a record; the returned book carries the assigned id.
    async fn create(&self, book: NewBook) -> Result<Book>;

    /// Overwrite an existing record. Fails with `NotFound` if `book.id` is unknown.
    async fn save(&self, book: Book) -> Result<Book>;

    /// Fails with `NotFound` if no record was removed.
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT id, name, description, rating FROM book_record ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT id, name, description, rating FROM book_record WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn create(&self, book: NewBook) -> Result<Book> {
        let created = sqlx::query_as::<_, Book>(
            "INSERT INTO book_record (name, description, rating) VALUES (?, ?, ?) \
             RETURNING id, name, description, rating",
        )
        .bind(&book.name)
        .bind(&book.description)
        .bind(book.rating)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(id = created.id, "book record created");
        Ok(created)
    }

    async fn save(&self, book: Book) -> Result<Book> {
        let saved = sqlx::query_as::<_, Book>(
            "UPDATE book_record SET name = ?, description = ?, rating = ? WHERE id = ? \
             RETURNING id, name, description, rating",
        )
        .bind(&book.name)
        .bind(&book.description)
        .bind(book.rating)
        .bind(book.id)
        .fetch_optional(&self.pool)
        .await?;
        saved.ok_or(RepositoryError::NotFound(book.id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM book_record WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            Err(RepositoryError::NotFound(id))
        } else {
            tracing::debug!(id, "book record deleted");
            Ok(())
        }
    }
}
