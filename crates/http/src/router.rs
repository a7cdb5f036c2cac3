//! Router builder for the shelf HTTP server

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use shelf_kernel::ModuleRegistry;

use crate::{error::AppError, MakeRequestUuid};

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
    api_prefix: String,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            api_prefix: String::new(),
        }
    }

    /// Nest every module router under `prefix` (e.g. `/api`); empty mounts at root
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Path a module is mounted at
    pub fn module_path(&self, module_name: &str) -> String {
        format!("{}/{}", self.api_prefix, module_name)
    }

    /// Mount a module's router under `{prefix}/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let module_path = self.module_path(module_name);
        self.router = self.router.nest(&module_path, module_router);
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Add request ID middleware; the id is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Add timeout middleware; a request running past the limit gets a JSON 408
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        let limit = Duration::from_millis(timeout_ms);
        self.router = self.router.layer(middleware::from_fn(
            move |request: Request, next: Next| async move {
                match tokio::time::timeout(limit, next.run(request)).await {
                    Ok(response) => response,
                    Err(_) => AppError::timeout().into_response(),
                }
            },
        ));
        self
    }

    /// Serve the merged OpenAPI document of all modules at `/docs/openapi.json`
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merged_openapi(registry, &self.api_prefix);

        // Round-trip through utoipa so consumers get a well-formed document
        let document = match serde_json::from_value::<utoipa::openapi::OpenApi>(openapi_spec.clone())
        {
            Ok(openapi) => serde_json::to_value(&openapi).unwrap_or(openapi_spec),
            Err(e) => {
                tracing::warn!(error = %e, "merged OpenAPI document failed validation; serving raw");
                openapi_spec
            }
        };

        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(document.clone()) }),
        );

        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge the base document with each module's paths and schemas
fn merged_openapi(registry: &ModuleRegistry, api_prefix: &str) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "shelf API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Authenticated book catalogue"
        },
        "paths": {},
        "components": {
            "schemas": {},
            "securitySchemes": {
                "bearerAuth": {
                    "type": "http",
                    "scheme": "bearer"
                }
            }
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "error": {
                "type": "string"
            }
        },
        "required": ["error"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": {
                            "schema": {
                                "type": "string"
                            }
                        }
                    }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                let mounted = format!("{}/{}", api_prefix, module.name());
                let prefixed_path = if path == "/" {
                    mounted
                } else {
                    format!("{}{}", mounted, path)
                };
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}
