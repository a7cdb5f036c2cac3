use async_trait::async_trait;
use shelf_db::{RestClient, Select, StoreError};

use super::models::Book;
use super::params::ListBooksQuery;

pub const BOOKS_TABLE: &str = "books";
pub const BOOKS_COLUMNS: &str = "*, authors(name)";
pub const PUBLISH_DATE: &str = "publish_date";
pub const AUTHOR_REF: &str = "author_id";

/// Read access to the book catalogue.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn list(&self, query: &ListBooksQuery) -> Result<Vec<Book>, StoreError>;
}

/// Translate a listing request into a data API read.
pub fn books_select(query: &ListBooksQuery) -> Select {
    let (from, to) = query.row_range();
    let select = Select::table(BOOKS_TABLE)
        .columns(BOOKS_COLUMNS)
        .order(PUBLISH_DATE, query.sort.is_ascending())
        .range(from, to);

    match &query.author_id {
        Some(author_id) => select.eq(AUTHOR_REF, author_id.as_str()),
        None => select,
    }
}

#[async_trait]
impl BookRepository for RestClient {
    async fn list(&self, query: &ListBooksQuery) -> Result<Vec<Book>, StoreError> {
        self.fetch(&books_select(query)).await
    }
}
