#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Transport failure, non-2xx status, or a body that is not JSON.
    #[error("request to '{endpoint}' failed{}: {message}", status_suffix(.status))]
    RemoteRequestFailed {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {message}")]
    ClientBuild { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" with HTTP {}", status),
        None => String::new(),
    }
}

impl Error {
    /// HTTP status of a failed remote request, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RemoteRequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}
