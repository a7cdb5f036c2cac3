use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row of the `books` table with its `authors(name)` embed.
///
/// The row is passed through exactly as the data API returned it; column
/// types are the database's business, not this service's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Book {
    pub columns: Map<String, Value>,
}

impl Book {
    /// Primary key, opaque to this service
    pub fn id(&self) -> Option<&Value> {
        self.columns.get("id")
    }

    pub fn publish_date(&self) -> Option<&Value> {
        self.columns.get("publish_date")
    }

    /// Name from the embedded author, whether the embed is an object or a
    /// one-element array.
    pub fn author_name(&self) -> Option<&str> {
        let authors = self.columns.get("authors")?;
        let author = match authors {
            Value::Array(items) => items.first()?,
            other => other,
        };
        author.get("name")?.as_str()
    }
}

/// Success envelope of `GET /books`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListBooksResponse {
    pub data: Vec<Book>,
}
