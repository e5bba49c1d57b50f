use std::path::PathBuf;

use shared::error::{ApiException, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend rejected {endpoint}: {source}")]
    Api {
        endpoint: String,
        #[source]
        source: ApiException,
    },
    #[error("unexpected response body from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read answer sheet '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid file part '{filename}': {source}")]
    FilePart {
        filename: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Backend error code when the server answered with a non-success status.
    pub fn api_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { source, .. } => Some(source.code),
            _ => None,
        }
    }
}
