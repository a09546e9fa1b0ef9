//! Error taxonomy untuk gateway.
//!
//! - [`ConfigError`]: environment tidak valid saat startup
//! - [`UpstreamError`]: kegagalan fetch ke node upstream
//! - [`GatewayError`]: error yang dipetakan front door ke error envelope

use axum::http::StatusCode;
use thiserror::Error;

/// Invalid gateway configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} invalid: '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("unknown gateway mode '{0}' (expected 'static' or 'live')")]
    InvalidMode(String),

    #[error("upstream base must be an http(s) URL, got '{0}'")]
    InvalidUpstreamBase(String),
}

/// Failure talking to an upstream node.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to build upstream HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("upstream {path} request failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream {path} HTTP {status}")]
    Status { path: String, status: u16 },
}

impl UpstreamError {
    /// Upstream answered 429 and no fresh cache entry could stand in.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 429, .. })
    }
}

/// Everything the front door can turn into an error envelope.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Endpoint not found")]
    NotFound,

    #[error("Only GET supported by ops gateway")]
    MethodNotAllowed,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NotFound => "NOT_FOUND",
            GatewayError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            GatewayError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Routing errors are local and final; upstream errors may clear up.
    pub fn retryable(&self) -> bool {
        matches!(self, GatewayError::Upstream(_))
    }
}
