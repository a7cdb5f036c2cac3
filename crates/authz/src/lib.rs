//! Bearer-token authentication for shelf.
//!
//! [`bearer_token`] pulls the token out of request headers and
//! [`TokenVerifier`] is the seam handlers authenticate through. The hosted
//! auth API implementation lives in [`gotrue`].

use async_trait::async_trait;
use http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use thiserror::Error;

pub mod gotrue;

pub use gotrue::GoTrueVerifier;

const BEARER_PREFIX: &str = "Bearer ";

/// Caller identity returned by a successful verification.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingToken,

    #[error("authorization header is not a bearer token")]
    MalformedHeader,

    #[error("token rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("token did not resolve to a user")]
    NoUser,

    #[error("auth service request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Verifies a bearer token and resolves the caller.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// A header without the `Bearer ` prefix, with non-visible-ASCII bytes or an
/// empty token is [`AuthError::MalformedHeader`]; it never reaches a verifier.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AuthError::MalformedHeader)?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}
