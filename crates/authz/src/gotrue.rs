//! Token verification against a GoTrue-compatible `/auth/v1/user` endpoint.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use url::Url;

use crate::{AuthError, AuthenticatedUser, TokenVerifier};

/// Verifies tokens by asking the hosted auth service who they belong to.
#[derive(Clone)]
pub struct GoTrueVerifier {
    http_client: HttpClient,
    user_url: Url,
    api_key: String,
}

impl GoTrueVerifier {
    /// `user_url` is the fully resolved user endpoint, e.g.
    /// `https://project.example.co/auth/v1/user`.
    pub fn new(http_client: HttpClient, user_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            user_url,
            api_key: api_key.into(),
        }
    }

    pub fn user_url(&self) -> &Url {
        &self.user_url
    }
}

#[async_trait]
impl TokenVerifier for GoTrueVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let response = self
            .http_client
            .get(self.user_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "failed to read auth service error body");
                String::new()
            });
            tracing::debug!(status = status.as_u16(), "auth service rejected token");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: rejection_message(&body, status.as_u16()),
            });
        }

        let user: AuthenticatedUser = response.json().await?;
        if user.id.is_empty() {
            return Err(AuthError::NoUser);
        }

        Ok(user)
    }
}

/// Pick the human-readable part of an auth service error body.
fn rejection_message(body: &str, status: u16) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_prefers_msg_field() {
        let body = r#"{"code":401,"msg":"invalid JWT: token is expired"}"#;
        assert_eq!(rejection_message(body, 401), "invalid JWT: token is expired");
    }

    #[test]
    fn rejection_message_falls_back_to_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid token"}"#;
        assert_eq!(rejection_message(body, 400), "Invalid token");
    }

    #[test]
    fn rejection_message_uses_raw_body_or_status() {
        assert_eq!(rejection_message("upstream down", 502), "upstream down");
        assert_eq!(rejection_message("", 403), "HTTP 403");
    }

    /// Serve a fake `/auth/v1/user` that accepts only `Bearer good` with
    /// the `anon-key` api key, answering `user` for it.
    async fn serve(user: serde_json::Value) -> Url {
        use axum::{
            http::{HeaderMap, StatusCode},
            response::IntoResponse,
            routing::get,
            Json,
        };

        let app = axum::Router::new().route(
            "/auth/v1/user",
            get(move |headers: HeaderMap| async move {
                let header = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                if header("apikey").as_deref() != Some("anon-key")
                    || header("authorization").as_deref() != Some("Bearer good")
                {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(serde_json::json!({"code": 401, "msg": "invalid JWT"})),
                    )
                        .into_response();
                }
                Json(user).into_response()
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/auth/v1/user")).unwrap()
    }

    #[tokio::test]
    async fn accepted_token_resolves_the_user() {
        let url = serve(serde_json::json!({"id": "u-1", "email": "a@b.c"})).await;
        let verifier = GoTrueVerifier::new(HttpClient::new(), url, "anon-key");

        let user = verifier.verify("good").await.unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
    }

    #[tokio::test]
    async fn rejected_token_carries_status_and_message() {
        let url = serve(serde_json::json!({"id": "u-1"})).await;
        let verifier = GoTrueVerifier::new(HttpClient::new(), url, "anon-key");

        match verifier.verify("expired").await {
            Err(AuthError::Rejected { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid JWT");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn user_without_id_is_no_user() {
        let url = serve(serde_json::json!({"id": ""})).await;
        let verifier = GoTrueVerifier::new(HttpClient::new(), url, "anon-key");

        assert!(matches!(verifier.verify("good").await, Err(AuthError::NoUser)));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let url = Url::parse("http://127.0.0.1:9/auth/v1/user").unwrap();
        let verifier = GoTrueVerifier::new(HttpClient::new(), url, "anon-key");

        assert!(matches!(verifier.verify("good").await, Err(AuthError::Transport(_))));
    }

    #[test]
    fn verifier_keeps_resolved_endpoint() {
        let url = Url::parse("https://project.example.co/auth/v1/user").unwrap();
        let verifier = GoTrueVerifier::new(HttpClient::new(), url.clone(), "anon-key");
        assert_eq!(verifier.user_url(), &url);
    }

    #[test]
    fn user_payload_deserializes_with_optional_fields() {
        let user: AuthenticatedUser =
            serde_json::from_str(r#"{"id":"u-1","aud":"authenticated","role":"authenticated"}"#)
                .unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.email, None);
        assert_eq!(user.role.as_deref(), Some("authenticated"));
    }
}
