//! Error types for Serve dashboard operations
//!
//! Transport failures are kept apart from body encoding/decoding failures:
//! the former usually mean the head pod is not ready yet and are worth a
//! requeue, the latter mean the dashboard and operator disagree on the API.

use thiserror::Error;

/// Errors returned by the dashboard client
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was invoked before `init_client`
    #[error("dashboard client not initialized: call init_client with the dashboard address first")]
    NotInitialized,

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {message}")]
    ClientBuild {
        /// Description of what failed
        message: String,
    },

    /// The request did not complete (connection refused, timeout, DNS)
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Request URL
        url: String,
        /// The underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// The request body could not be serialized
    #[error("failed to encode serve deployments: {source}")]
    Encoding {
        /// The underlying serde error
        #[from]
        source: serde_json::Error,
    },

    /// The response body could not be decoded
    #[error("failed to decode response from {url}: {source}")]
    Decoding {
        /// Request URL
        url: String,
        /// The underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// A deployment graph file could not be read or parsed
    #[error("invalid deployment graph file {path}: {message}")]
    GraphFile {
        /// Path of the file
        path: String,
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a transport error for a request URL
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Create a decoding error for a request URL
    pub fn decoding(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decoding {
            url: url.into(),
            source,
        }
    }

    /// Create a graph file error
    pub fn graph_file(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::GraphFile {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Only transport failures are; the dashboard may simply not be up yet.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::NotInitialized => false,
            Error::ClientBuild { .. } => false,
            Error::Encoding { .. } => false,
            Error::Decoding { .. } => false,
            Error::GraphFile { .. } => false,
        }
    }
}
