//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: CORS preflight, route matching,
//! body-size enforcement, dispatch to the API and access logging.

use crate::api::{self, Endpoint, Route};
use crate::config::AppState;
use crate::http::{self, BodyError};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_TYPE, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let start = Instant::now();
    let mut entry = state.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.http_version = http_version(req.version()).to_string();
        entry.user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        entry
    });

    let mut resp = route_request(req, &state).await;
    http::apply_common_headers(
        &mut resp,
        &state.config.http.server_name,
        state.config.http.enable_cors,
    );

    if let Some(entry) = entry.as_mut() {
        entry.status = resp.status().as_u16();
        entry.body_bytes = usize::try_from(resp.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(resp)
}

const fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Resolve, size-check and read the request, then hand it to the API
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // 1. CORS preflight, valid for any path
    if req.method() == Method::OPTIONS {
        return http::build_options_response(state.config.http.enable_cors);
    }

    // 2. Route table
    let endpoint = match Endpoint::resolve(req.method(), req.uri().path()) {
        Route::Found(endpoint) => endpoint,
        Route::MethodNotAllowed(allow) => {
            logger::log_warning(&format!(
                "Method not allowed: {} {}",
                req.method(),
                req.uri().path()
            ));
            return http::build_405_response(allow);
        }
        Route::NotFound => return http::build_404_response(),
    };

    // 3. Declared body size
    let max_body_size = state.config.http.max_body_size;
    if http::declared_length_exceeds(req.headers(), max_body_size) {
        logger::log_error(&format!(
            "Request body too large for {} (max: {max_body_size})",
            endpoint.path()
        ));
        return http::build_413_response(max_body_size);
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    // 4. Read the body under the same cap
    let body = match http::read_limited(req.into_body(), max_body_size).await {
        Ok(body) => body,
        Err(BodyError::TooLarge) => {
            logger::log_error(&format!(
                "Request body exceeded {max_body_size} bytes while reading {}",
                endpoint.path()
            ));
            return http::build_413_response(max_body_size);
        }
        Err(BodyError::Read(e)) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            return http::build_json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({"status": "error", "message": "failed to read request body"}),
            );
        }
    };

    // 5. Dispatch
    logger::log_debug(
        state.debug,
        &format!("{} {} ({} bytes)", endpoint.method(), endpoint.path(), body.len()),
    );
    api::dispatch(endpoint, content_type.as_deref(), body, state.debug).await
}
