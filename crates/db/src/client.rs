use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{Select, StoreError};

/// Shared handle to the data API. Cheap to clone; clones reuse one
/// connection pool.
#[derive(Clone)]
pub struct RestClient {
    http_client: HttpClient,
    rest_url: Url,
    api_key: String,
}

impl RestClient {
    /// `rest_url` is the data API root, e.g. `https://project.example.co/rest/v1/`.
    pub fn new(http_client: HttpClient, rest_url: Url, api_key: impl Into<String>) -> Self {
        let mut rest_url = rest_url;
        if !rest_url.path().ends_with('/') {
            let path = format!("{}/", rest_url.path());
            rest_url.set_path(&path);
        }

        Self {
            http_client,
            rest_url,
            api_key: api_key.into(),
        }
    }

    /// Resolve the full request URL for `select`.
    pub fn select_url(&self, select: &Select) -> Result<Url, StoreError> {
        let mut url = self.rest_url.join(select.table_name())?;
        url.query_pairs_mut().extend_pairs(select.query_pairs());
        Ok(url)
    }

    /// Run `select` and decode every returned row as `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, select: &Select) -> Result<Vec<T>, StoreError> {
        let url = self.select_url(select)?;
        tracing::debug!(table = select.table_name(), %url, "data api select");

        let response = self
            .http_client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "failed to read data api error body");
                String::new()
            });
            return Err(StoreError::from_response(status.as_u16(), &body));
        }

        Ok(response.json::<Vec<T>>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> RestClient {
        RestClient::new(HttpClient::new(), Url::parse(base).unwrap(), "anon-key")
    }

    #[test]
    fn select_url_appends_table_and_query() {
        let select = Select::table("books")
            .columns("*, authors(name)")
            .order("publish_date", false)
            .range(10, 19)
            .eq("author_id", "a b&c");

        let url = client("https://project.example.co/rest/v1/")
            .select_url(&select)
            .unwrap();

        assert_eq!(url.path(), "/rest/v1/books");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*,authors(name)".to_string()),
                ("order".to_string(), "publish_date.desc".to_string()),
                ("author_id".to_string(), "eq.a b&c".to_string()),
                ("offset".to_string(), "10".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    /// Serve `app` on an ephemeral local port and return its `/rest/v1/` root.
    async fn serve(app: axum::Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/rest/v1/")).unwrap()
    }

    #[tokio::test]
    async fn fetch_sends_key_headers_and_decodes_rows() {
        use axum::{extract::RawQuery, http::HeaderMap, routing::get, Json};
        use serde_json::{json, Value};

        let app = axum::Router::new().route(
            "/rest/v1/books",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                Json(json!([{
                    "apikey": headers["apikey"].to_str().unwrap(),
                    "authorization": headers["authorization"].to_str().unwrap(),
                    "query": query,
                }]))
            }),
        );
        let client = RestClient::new(HttpClient::new(), serve(app).await, "anon-key");

        let rows: Vec<Value> = client
            .fetch(&Select::table("books").order("publish_date", true).range(0, 9))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["apikey"], "anon-key");
        assert_eq!(rows[0]["authorization"], "Bearer anon-key");
        assert_eq!(
            rows[0]["query"],
            "select=*&order=publish_date.asc&offset=0&limit=10"
        );
    }

    #[tokio::test]
    async fn fetch_maps_failed_response_to_api_error() {
        use axum::{http::StatusCode, routing::get};

        let app = axum::Router::new().route(
            "/rest/v1/books",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    r#"{"code":"42703","message":"column books.nope does not exist"}"#,
                )
            }),
        );
        let client = RestClient::new(HttpClient::new(), serve(app).await, "anon-key");

        let err = client
            .fetch::<serde_json::Value>(&Select::table("books"))
            .await
            .unwrap_err();

        match &err {
            StoreError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(*status, 400);
                assert_eq!(code.as_deref(), Some("42703"));
                assert_eq!(message, "column books.nope does not exist");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(err.to_string(), "column books.nope does not exist");
    }

    #[tokio::test]
    async fn fetch_reports_undecodable_rows_as_transport_error() {
        use axum::routing::get;

        let app = axum::Router::new().route("/rest/v1/books", get(|| async { "not json" }));
        let client = RestClient::new(HttpClient::new(), serve(app).await, "anon-key");

        let err = client
            .fetch::<serde_json::Value>(&Select::table("books"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)), "{err:?}");
    }

    #[test]
    fn missing_trailing_slash_keeps_rest_path() {
        let url = client("https://project.example.co/rest/v1")
            .select_url(&Select::table("books"))
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/books");
    }
}
