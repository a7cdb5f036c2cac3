//! Process-wide wiring: one shared HTTP client, the collaborators built on
//! it, and the module lifecycle around the server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use shelf_authz::{GoTrueVerifier, TokenVerifier};
use shelf_db::RestClient;
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules::{self, books::repository::BookRepository};

const USER_PATH: &str = "auth/v1/user";
const REST_PATH: &str = "rest/v1/";

/// External services the modules depend on, built once per process.
#[derive(Clone)]
pub struct Collaborators {
    pub verifier: Arc<dyn TokenVerifier>,
    pub books: Arc<dyn BookRepository>,
}

impl Collaborators {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let datastore = &settings.datastore;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(datastore.timeout_ms))
            .user_agent(concat!("shelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        let verifier = GoTrueVerifier::new(
            http_client.clone(),
            datastore.endpoint(USER_PATH)?,
            datastore.api_key.clone(),
        );
        let books = RestClient::new(
            http_client,
            datastore.endpoint(REST_PATH)?,
            datastore.api_key.clone(),
        );

        Ok(Self {
            verifier: Arc::new(verifier),
            books: Arc::new(books),
        })
    }
}

/// Register every module against `collaborators`.
pub fn build_registry(collaborators: &Collaborators) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, collaborators)?;
    Ok(registry)
}

/// Build, initialize and start all modules.
async fn start_modules(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let collaborators = Collaborators::from_settings(settings)?;
    let registry = build_registry(&collaborators)?;

    let ctx = InitCtx { settings };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    Ok(registry)
}

/// Start all modules, returning them with the full router.
///
/// Runtimes that own their own listener (e.g. Lambda) serve the router and
/// call [`ModuleRegistry::stop_all`] when done.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(ModuleRegistry, Router)> {
    let registry = start_modules(settings).await?;
    let router = shelf_http::build_router(&registry, settings);
    Ok((registry, router))
}

/// Run the TCP server until a shutdown signal, then stop modules.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = start_modules(&settings).await?;

    let served = shelf_http::start_server(&registry, &settings).await;
    registry.stop_all().await?;
    served?;

    tracing::info!("shelf-app stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.datastore.url = "http://127.0.0.1:9".to_string();
        settings.datastore.api_key = "anon-key".to_string();
        settings.server.api_prefix = "/api".to_string();
        settings
    }

    #[test]
    fn registry_contains_books() {
        let collaborators = Collaborators::from_settings(&settings()).unwrap();
        let registry = build_registry(&collaborators).unwrap();
        assert!(registry.get_module("books").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn collaborators_require_a_parseable_url() {
        let mut settings = settings();
        settings.datastore.url = "::nope::".to_string();
        assert!(Collaborators::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn prepared_router_serves_books_under_prefix() {
        let (registry, router) = prepare(&settings()).await.unwrap();

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/api/books").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("x-request-id"));

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/books")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        registry.stop_all().await.unwrap();
    }
}
