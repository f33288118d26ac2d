//! HTTP handlers for book records, each a thin translation to repository calls.

use axum::{extract::State, routing::get, Json, Router};
use bookshelf_http::{ApiPath, ApiResult, AppError, ValidJson};

use super::models::{Book, BookPayload, NewBook};
use super::repository::{RepositoryError, SharedBookRepository};

pub fn router(repository: SharedBookRepository) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book).put(update_book))
        .route("/{id}", get(get_book).delete(delete_book))
        .with_state(repository)
}

async fn list_books(State(repository): State<SharedBookRepository>) -> ApiResult<Json<Vec<Book>>> {
    let books = repository.find_all().await?;
    Ok(Json(books))
}

async fn get_book(
    State(repository): State<SharedBookRepository>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Book>> {
    repository
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found_record(id))
}

async fn create_book(
    State(repository): State<SharedBookRepository>,
    ValidJson(payload): ValidJson<BookPayload>,
) -> ApiResult<Json<Book>> {
    if let Some(id) = payload.id {
        tracing::debug!(id, "ignoring client-supplied id on create");
    }
    let book = repository.create(NewBook::from(payload)).await?;
    tracing::info!(id = book.id, "book record created");
    Ok(Json(book))
}

async fn update_book(
    State(repository): State<SharedBookRepository>,
    ValidJson(payload): ValidJson<BookPayload>,
) -> ApiResult<Json<Book>> {
    let id = payload
        .id
        .ok_or_else(|| AppError::bad_request("book id is required for update"))?;

    let mut book = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found_record(id))?;
    book.apply(payload);

    let book = repository.save(book).await?;
    tracing::info!(id = book.id, "book record updated");
    Ok(Json(book))
}

async fn delete_book(
    State(repository): State<SharedBookRepository>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    repository.delete_by_id(id).await.map_err(|err| {
        tracing::warn!(id, error = %err, "delete failed");
        AppError::not_found(format!("Not found book with id = {}", id))
    })?;
    tracing::info!(id, "book record deleted");
    Ok(())
}

fn not_found_record(id: i64) -> AppError {
    RepositoryError::NotFound(id).into()
}
