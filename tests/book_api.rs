use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::{self, Request, StatusCode},
    Router,
};
use bookshelf_app::modules::{
    self,
    books::{
        models::{Book, NewBook},
        repository::{BookRepository, RepositoryError, SqliteBookRepository},
    },
};
use bookshelf_kernel::{
    settings::{DatabaseSettings, Settings},
    ModuleRegistry,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_test::traced_test;

struct TestApp {
    router: Router,
    repository: Arc<SqliteBookRepository>,
}

impl TestApp {
    async fn new() -> Self {
        let pool = bookshelf_db::connect(&DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
        .unwrap();
        let repository = Arc::new(SqliteBookRepository::new(pool.clone()));

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, repository.clone()).unwrap();
        bookshelf_db::run_migrations(&pool, &registry.collect_migrations())
            .await
            .unwrap();

        let router = bookshelf_http::build_router(&registry, &Settings::default());
        Self { router, repository }
    }

    /// Storage holding `{1,"A",5}` and `{2,"B",5}`.
    async fn seeded() -> Self {
        let app = Self::new().await;
        for name in ["A", "B"] {
            app.repository
                .create(NewBook {
                    name: name.to_string(),
                    description: None,
                    rating: 5,
                })
                .await
                .unwrap();
        }
        app
    }

    async fn send(&self, request: Request<String>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn stored(&self) -> Vec<Book> {
        self.repository.find_all().await.unwrap()
    }
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn book(id: i64, name: &str, description: Option<&str>, rating: i32) -> Value {
    json!({"id": id, "name": name, "description": description, "rating": rating})
}

// --- list ---

#[tokio::test]
async fn list_empty_storage_returns_empty_array() {
    let app = TestApp::new().await;
    let (status, body) = app.send(empty_request("GET", "/book")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_returns_records_in_storage_order() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send(empty_request("GET", "/book")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([book(1, "A", None, 5), book(2, "B", None, 5)]));
}

// --- get ---

#[tokio::test]
async fn get_known_id_returns_record() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send(empty_request("GET", "/book/2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, book(2, "B", None, 5));
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send(empty_request("GET", "/book/99")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "Not found book record with id = 99");
}

#[tokio::test]
async fn get_non_numeric_id_is_bad_request() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send(empty_request("GET", "/book/abc")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

// --- create ---

#[tokio::test]
async fn create_assigns_id_and_echoes_fields() {
    let app = TestApp::seeded().await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/book",
            json!({"name": "Introduction to Java", "description": "Java core", "rating": 5}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, book(3, "Introduction to Java", Some("Java core"), 5));
    assert_eq!(app.stored().await.len(), 3);
}

#[tokio::test]
async fn create_ignores_client_supplied_id() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/book",
            json!({"id": 42, "name": "Spring in action", "rating": 5}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn create_with_null_rating_stores_zero() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request("POST", "/book", json!({"name": "A", "rating": null})))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, book(1, "A", None, 0));
}

#[tokio::test]
async fn create_with_empty_name_is_validation_error() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request("POST", "/book", json!({"name": "", "rating": 5})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"][0]["field"], "name");
    assert!(app.stored().await.is_empty());
}

#[tokio::test]
async fn create_without_name_is_validation_error() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request("POST", "/book", json!({"rating": 5})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(app.stored().await.is_empty());
}

// --- update ---

#[tokio::test]
async fn update_overwrites_fields_and_keeps_id() {
    let app = TestApp::seeded().await;
    let (status, body) = app
        .send(json_request("PUT", "/book", book(1, "A2", Some("d"), 4)))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, book(1, "A2", Some("d"), 4));
    assert_eq!(
        app.stored().await[0],
        Book::builder().id(1).name("A2").description("d").rating(4).build()
    );
}

#[tokio::test]
async fn update_unknown_id_is_not_found_and_leaves_storage() {
    let app = TestApp::seeded().await;
    let before = app.stored().await;

    let (status, body) = app
        .send(json_request("PUT", "/book", book(7, "ghost", None, 1)))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Not found book record with id = 7");
    assert_eq!(app.stored().await, before);
}

#[tokio::test]
async fn update_without_id_is_bad_request() {
    let app = TestApp::seeded().await;
    let (status, body) = app
        .send(json_request("PUT", "/book", json!({"name": "A2", "rating": 4})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn update_with_empty_name_is_validation_error() {
    let app = TestApp::seeded().await;
    let before = app.stored().await;
    let (status, _) = app
        .send(json_request("PUT", "/book", book(1, "", None, 4)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stored().await, before);
}

// --- delete ---

#[tokio::test]
async fn delete_known_id_returns_empty_ok() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send(empty_request("DELETE", "/book/2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
    assert_eq!(
        app.stored().await,
        vec![Book::builder().id(1).name("A").rating(5).build()]
    );
}

#[tokio::test]
async fn delete_unknown_id_is_not_found() {
    let app = TestApp::seeded().await;
    let (status, body) = app.send(empty_request("DELETE", "/book/99")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Not found book with id = 99");
    assert_eq!(app.stored().await.len(), 2);
}

// --- scenario ---

#[tokio::test]
async fn list_update_delete_scenario() {
    let app = TestApp::seeded().await;

    let (_, listed) = app.send(empty_request("GET", "/book")).await;
    assert_eq!(listed, json!([book(1, "A", None, 5), book(2, "B", None, 5)]));

    let (status, updated) = app
        .send(json_request("PUT", "/book", book(1, "A2", Some("d"), 4)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated, book(1, "A2", Some("d"), 4));

    let (status, _) = app.send(empty_request("DELETE", "/book/2")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = app.send(empty_request("GET", "/book")).await;
    assert_eq!(listed, json!([book(1, "A2", Some("d"), 4)]));

    let (status, _) = app.send(empty_request("DELETE", "/book/2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- internal failures ---

struct BrokenRepository;

#[async_trait]
impl BookRepository for BrokenRepository {
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolClosed))
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<Book>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolClosed))
    }

    async fn create(&self, _book: NewBook) -> Result<Book, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolClosed))
    }

    async fn save(&self, _book: Book) -> Result<Book, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolClosed))
    }

    async fn delete_by_id(&self, _id: i64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolClosed))
    }
}

fn broken_router() -> Router {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Arc::new(BrokenRepository)).unwrap();
    bookshelf_http::build_router(&registry, &Settings::default())
}

async fn send_to(router: Router, request: Request<String>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
#[traced_test]
async fn storage_failure_is_generic_internal_error() {
    let (status, body) = send_to(broken_router(), empty_request("GET", "/book")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");
    assert_eq!(body["error"]["message"], "Something went wrong.");
    assert!(!body.to_string().contains("pool"));
    assert!(logs_contain("Request failed with internal error"));
}

#[tokio::test]
async fn storage_failure_on_update_is_internal_error() {
    let (status, body) = send_to(
        broken_router(),
        json_request("PUT", "/book", book(1, "A2", None, 4)),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Something went wrong.");
}

#[tokio::test]
#[traced_test]
async fn storage_failure_on_delete_reports_not_found() {
    let (status, body) = send_to(broken_router(), empty_request("DELETE", "/book/1")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Not found book with id = 1");
    assert!(logs_contain("delete failed"));
}

// --- router surface ---

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new().await;
    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/book"))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn openapi_document_lists_book_paths() {
    let app = TestApp::new().await;
    let (status, body) = app.send(empty_request("GET", "/docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/book"]["put"].is_object());
    assert!(body["paths"]["/book/{id}"]["delete"].is_object());
}
