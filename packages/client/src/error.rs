//! Error taxonomy for the client.
//!
//! Errors from the lower layers are flattened into this enum so callers can
//! match on one type: a malformed identifier is always
//! [`Error::InvalidIdentifier`], whichever layer noticed it.

use pagekit_records::Identifier;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed identifier string. Raised before any network activity.
    #[error("invalid identifier '{raw}': {message}")]
    InvalidIdentifier { raw: String, message: String },

    /// An attribute path could not be navigated or written.
    #[error("invalid attribute path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Transport failure, non-2xx status or non-JSON response.
    #[error("request to '{endpoint}' failed{}: {message}", status_suffix(.status))]
    RemoteRequestFailed {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// An update named a property that is neither `title` nor in the schema.
    #[error("unknown property '{name}'")]
    UnknownProperty { name: String },

    /// A value cannot be written to a property of the given type.
    #[error("invalid value for property '{name}': {message}")]
    InvalidValue { name: String, message: String },

    /// The server returned nothing where a record was required.
    #[error("{table} record {} not found", id_or_any(.id))]
    RecordNotFound {
        table: String,
        id: Option<Identifier>,
    },

    /// A network operation was attempted on a block with no client.
    #[error("record {id} is detached from any client and is read-only")]
    Detached { id: Identifier },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" with HTTP {}", status),
        None => String::new(),
    }
}

fn id_or_any(id: &Option<Identifier>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<any>".to_string(),
    }
}

impl Error {
    pub(crate) fn not_found(table: &str, id: Identifier) -> Self {
        Error::RecordNotFound {
            table: table.to_string(),
            id: Some(id),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

impl From<pagekit_records::Error> for Error {
    fn from(error: pagekit_records::Error) -> Self {
        match error {
            pagekit_records::Error::InvalidIdentifier { raw, message } => {
                Error::InvalidIdentifier { raw, message }
            }
            pagekit_records::Error::InvalidPath { path, message } => {
                Error::InvalidPath { path, message }
            }
            pagekit_records::Error::Json(e) => Error::Json(e),
        }
    }
}

impl From<pagekit_http::Error> for Error {
    fn from(error: pagekit_http::Error) -> Self {
        match error {
            pagekit_http::Error::RemoteRequestFailed {
                endpoint,
                status,
                message,
            } => Error::RemoteRequestFailed {
                endpoint,
                status,
                message,
            },
            pagekit_http::Error::UrlParse(e) => {
                Error::config(format!("invalid API base URL: {}", e))
            }
            pagekit_http::Error::ClientBuild { message } => Error::config(message),
            pagekit_http::Error::Json(e) => Error::Json(e),
        }
    }
}
