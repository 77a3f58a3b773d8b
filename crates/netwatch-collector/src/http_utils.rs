// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{
    header,
    http::{self, HeaderMap},
    Response, StatusCode,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

pub type HttpResponse = Response<Full<Bytes>>;

/// JSON error body returned for rejected requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Logs the given message (debug for 2xx, error otherwise) and wraps it in
/// a `{"message": ...}` JSON response with the given status code.
pub fn log_and_create_http_response(
    message: &str,
    status: StatusCode,
) -> http::Result<HttpResponse> {
    if status.is_success() {
        debug!("{message}");
    } else {
        error!("{message}");
    }
    let body = json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
}

/// Logs and returns a structured [`ErrorResponse`] body.
pub fn log_and_create_error_response(
    error_label: &str,
    detail: &str,
    status: StatusCode,
) -> http::Result<HttpResponse> {
    error!("{error_label}: {detail}");
    let body = ErrorResponse {
        error: error_label.to_string(),
        detail: Some(detail.to_string()),
        timestamp: Utc::now(),
    };
    json_response(status, &body)
}

/// Serializes `body` as the JSON payload of a response with the given
/// status code.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> http::Result<HttpResponse> {
    let body = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
}

/// Verifies that the request declares a body no larger than
/// `max_content_length` via `Content-Length` (or is chunked via
/// `Transfer-Encoding`).
///
/// Returns `None` when the request is acceptable, otherwise logs with the
/// given prefix and returns the error response to send back.
pub fn verify_request_content_length(
    header_map: &HeaderMap,
    max_content_length: usize,
    error_message_prefix: &str,
) -> Option<http::Result<HttpResponse>> {
    let content_length_header = match header_map.get(header::CONTENT_LENGTH) {
        Some(header) => header,
        None => {
            if header_map.contains_key(header::TRANSFER_ENCODING) {
                return None;
            }
            return Some(log_and_create_http_response(
                &format!(
                    "{error_message_prefix}: Missing Content-Length and Transfer-Encoding header"
                ),
                StatusCode::LENGTH_REQUIRED,
            ));
        }
    };

    let content_length = match content_length_header
        .to_str()
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
    {
        Some(length) => length,
        None => {
            return Some(log_and_create_http_response(
                &format!("{error_message_prefix}: Invalid Content-Length header"),
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    if content_length > max_content_length {
        return Some(log_and_create_http_response(
            &format!("{error_message_prefix}: Payload too large"),
            StatusCode::PAYLOAD_TOO_LARGE,
        ));
    }
    None
}
