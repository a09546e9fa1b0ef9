//! # Response Envelope
//!
//! Skema versioned yang dikonsumsi widget dashboard.
//!
//! ```text
//! sukses: {"version":"v1","generatedAt":"...","clusterId":"...","data":{...}}
//! error:  {"version":"v1","generatedAt":"...","error":{"code","message","retryable"}}
//! ```
//!
//! `generatedAt` selalu di-stamp saat response dibangun, tidak pernah di-cache.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::error;

use crate::error::GatewayError;

pub const ENVELOPE_VERSION: &str = "v1";

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// RFC 3339 UTC timestamp with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub version: &'static str,
    pub generated_at: String,
    pub cluster_id: String,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(cluster_id: impl Into<String>, data: T) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            generated_at: now_iso(),
            cluster_id: cluster_id.into(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, &self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub version: &'static str,
    pub generated_at: String,
    pub error: ErrorBody,
}

impl From<&GatewayError> for ErrorEnvelope {
    fn from(err: &GatewayError) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            generated_at: now_iso(),
            error: ErrorBody {
                code: err.code(),
                message: err.to_string(),
                retryable: err.retryable(),
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        json_response(self.status(), &ErrorEnvelope::from(&self))
    }
}

/// Serialize `body` with the gateway's JSON content type.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
