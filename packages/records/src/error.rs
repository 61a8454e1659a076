//! Error types for the records layer.
//!
//! Everything here is local validation. Nothing in this crate talks to the
//! network, so none of these errors ever carry a remote status.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid identifier '{raw}': {message}")]
    InvalidIdentifier { raw: String, message: String },

    #[error("invalid attribute path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
