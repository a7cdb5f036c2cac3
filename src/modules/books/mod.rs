pub mod handler;
pub mod models;
pub mod params;
pub mod repository;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::any, Router};
use shelf_authz::TokenVerifier;
use shelf_kernel::{InitCtx, Module};

use handler::{list_books, BooksState};
use repository::BookRepository;

/// Authenticated, paginated listing of the book catalogue
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(verifier: Arc<dyn TokenVerifier>, books: Arc<dyn BookRepository>) -> Self {
        Self {
            state: BooksState { verifier, books },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        // Every method reaches the handler so non-GET gets the JSON 405 body.
        Router::new()
            .route("/", any(list_books))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let query_param = |name: &str, schema: serde_json::Value, description: &str| {
            serde_json::json!({
                "name": name,
                "in": "query",
                "required": false,
                "description": description,
                "schema": schema
            })
        };

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "security": [{ "bearerAuth": [] }],
                        "parameters": [
                            query_param("author_id", serde_json::json!({"type": "string"}), "Only books by this author"),
                            query_param("sort", serde_json::json!({"type": "string", "enum": ["asc", "desc"], "default": "desc"}), "Publish date ordering"),
                            query_param("page", serde_json::json!({"type": "integer", "minimum": 1, "default": 1}), "1-based page number"),
                            query_param("page_size", serde_json::json!({"type": "integer", "minimum": 1, "default": 10}), "Rows per page")
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of books",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookPage" }
                                    }
                                }
                            },
                            "400": error("Store or query error"),
                            "401": error("Missing or invalid bearer token"),
                            "405": error("Method not allowed")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "description": "Row of the books table, passed through as stored",
                        "properties": {
                            "id": { "description": "Unique identifier for the book" },
                            "author_id": { "description": "Reference to the author" },
                            "publish_date": { "description": "Sort key of the listing" },
                            "authors": { "description": "Embedded author, `{\"name\": ...}`" }
                        },
                        "required": ["id"]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "data": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["data"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(
    verifier: Arc<dyn TokenVerifier>,
    books: Arc<dyn BookRepository>,
) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(verifier, books))
}
