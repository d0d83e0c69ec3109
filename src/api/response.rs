// API response envelope module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::types::ErrorResponse;
use crate::error::ApiError;
use crate::http::build_json_response;

/// 200 with a success envelope
pub fn success<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    build_json_response(StatusCode::OK, body)
}

/// `{"status":"error","message":...}` with the status of the error kind
pub fn error_response(error: &ApiError) -> Response<Full<Bytes>> {
    build_json_response(
        error.status(),
        &ErrorResponse {
            status: "error",
            message: error.to_string(),
        },
    )
}
