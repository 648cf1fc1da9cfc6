//! Response helpers
//!
//! Error bodies and HTTP date formatting.

use axum::Json;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::SystemTime;

use crate::error::ServerError;
use crate::error::handlers::handle_error;

const AUTH_CHALLENGE: &str = "Basic realm=\"media-shelf\"";

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = handle_error(&self);
        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        if status == axum::http::StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(AUTH_CHALLENGE),
            );
        }
        response
    }
}

/// Formats a timestamp as an HTTP date (RFC 7231 IMF-fixdate)
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// `Content-Disposition` value forcing a download under `name`
pub fn attachment_disposition(name: &str) -> HeaderValue {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_bytes(format!("attachment; filename=\"{escaped}\"").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
