pub mod models;
pub mod repository;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};

use repository::SharedBookRepository;

/// Book record module, mounted at `/book`
pub struct BooksModule {
    repository: SharedBookRepository,
}

impl BooksModule {
    pub fn new(repository: SharedBookRepository) -> Self {
        Self { repository }
    }

    /// Schema for the `book_record` table.
    pub fn schema() -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE IF NOT EXISTS book_record (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    name        TEXT NOT NULL CHECK (name <> ''),
                    description TEXT,
                    rating      INTEGER NOT NULL DEFAULT 0
                );
                "#,
        }]
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "book"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "book module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.repository.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Book" }
                    }
                }
            })
        };
        let book_body = serde_json::json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookPayload" }
                }
            }
        });
        let id_param = serde_json::json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List book records",
                        "tags": ["Book"],
                        "responses": {
                            "200": {
                                "description": "All book records in storage order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "500": error_response("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book record",
                        "tags": ["Book"],
                        "requestBody": book_body.clone(),
                        "responses": {
                            "200": book_response("Created book record"),
                            "400": error_response("Validation error"),
                            "500": error_response("Internal server error")
                        }
                    },
                    "put": {
                        "summary": "Update a book record",
                        "tags": ["Book"],
                        "requestBody": book_body,
                        "responses": {
                            "200": book_response("Updated book record"),
                            "400": error_response("Validation error or missing id"),
                            "404": error_response("Book record not found"),
                            "500": error_response("Internal server error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book record",
                        "tags": ["Book"],
                        "parameters": id_param.clone(),
                        "responses": {
                            "200": book_response("Book record"),
                            "400": error_response("Malformed id"),
                            "404": error_response("Book record not found"),
                            "500": error_response("Internal server error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book record",
                        "tags": ["Book"],
                        "parameters": id_param,
                        "responses": {
                            "200": { "description": "Deleted" },
                            "400": error_response("Malformed id"),
                            "404": error_response("Book record not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string", "minLength": 1 },
                            "description": { "type": "string", "nullable": true },
                            "rating": { "type": "integer", "format": "int32" }
                        },
                        "required": ["id", "name", "rating"]
                    },
                    "BookPayload": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "integer",
                                "format": "int64",
                                "description": "Ignored on create, required on update"
                            },
                            "name": { "type": "string", "minLength": 1 },
                            "description": { "type": "string", "nullable": true },
                            "rating": { "type": "integer", "format": "int32", "default": 0 }
                        },
                        "required": ["name"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        Self::schema()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "book module stopped");
        Ok(())
    }
}

/// Create a new instance of the book module around `repository`
pub fn create_module(repository: SharedBookRepository) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(repository))
}
