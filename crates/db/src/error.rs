use serde::Deserialize;
use thiserror::Error;

/// Failure of a data API read.
///
/// `Api` displays the store's own message untouched so callers can pass it
/// through to clients.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

/// Error body returned by the data API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl StoreError {
    /// Build an `Api` error from a failed response's status and body.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
        let (code, message) = match parsed {
            Some(ApiErrorBody {
                code,
                message: Some(message),
            }) => (code, message),
            Some(ApiErrorBody { code, message: None }) => (code, fallback_message(status, body)),
            None => (None, fallback_message(status, body)),
        };

        StoreError::Api {
            status,
            code,
            message,
        }
    }
}

fn fallback_message(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}
