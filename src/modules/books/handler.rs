use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    Json,
};
use shelf_authz::{bearer_token, AuthError, TokenVerifier};
use shelf_http::error::AppError;

use super::models::ListBooksResponse;
use super::params::{ListBooksParams, ListBooksQuery};
use super::repository::BookRepository;

pub const MISSING_TOKEN: &str = "Unauthorized: Missing token";
pub const INVALID_TOKEN: &str = "Unauthorized: Invalid token";

/// Collaborators the listing handler runs against.
#[derive(Clone)]
pub struct BooksState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub books: Arc<dyn BookRepository>,
}

/// `GET /books`
///
/// Stages run in order and the first failure ends the request: method,
/// token presence, token verification, store read. Query parsing never
/// fails; unusable values fall back to defaults.
pub async fn list_books(
    State(state): State<BooksState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<ListBooksResponse>, AppError> {
    if method != Method::GET {
        return Err(AppError::method_not_allowed());
    }

    let token = bearer_token(&headers).map_err(|e| match e {
        AuthError::MissingToken => AppError::unauthorized(MISSING_TOKEN),
        _ => AppError::unauthorized(INVALID_TOKEN),
    })?;

    let user = state.verifier.verify(token).await.map_err(|e| {
        tracing::debug!(error = %e, "token verification failed");
        AppError::unauthorized(INVALID_TOKEN)
    })?;

    let query = ListBooksQuery::from(ListBooksParams::from_query(raw_query.as_deref()));

    let data = state
        .books
        .list(&query)
        .await
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    tracing::debug!(
        user_id = %user.id,
        author_id = query.author_id.as_deref().unwrap_or("*"),
        page = query.page,
        page_size = query.page_size,
        rows = data.len(),
        "listed books"
    );

    Ok(Json(ListBooksResponse { data }))
}
