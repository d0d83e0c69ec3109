// API module entry
// Route table of the geometry endpoints and dispatch to their handlers

mod handlers;
mod multipart;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

use crate::logger;

use response::error_response;

/// Endpoints served by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Buffer,
    Simplify,
    Intersection,
    Analyze,
    Convert,
    Voronoi,
}

/// Outcome of matching a method and path against the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Found(Endpoint),
    /// Known path, other method; carries the `Allow` header value
    MethodNotAllowed(&'static str),
    NotFound,
}

impl Endpoint {
    pub const ALL: [Self; 7] = [
        Self::Health,
        Self::Buffer,
        Self::Simplify,
        Self::Intersection,
        Self::Analyze,
        Self::Convert,
        Self::Voronoi,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Health => "/api/health",
            Self::Buffer => "/api/buffer",
            Self::Simplify => "/api/simplify",
            Self::Intersection => "/api/intersection",
            Self::Analyze => "/api/analyze",
            Self::Convert => "/api/convert",
            Self::Voronoi => "/api/voronoi",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Self::Health => Method::GET,
            _ => Method::POST,
        }
    }

    const fn allow(self) -> &'static str {
        match self {
            Self::Health => "GET, OPTIONS",
            _ => "POST, OPTIONS",
        }
    }

    pub fn resolve(method: &Method, path: &str) -> Route {
        match Self::ALL.into_iter().find(|e| e.path() == path) {
            Some(endpoint) if endpoint.method() == method => Route::Found(endpoint),
            Some(endpoint) => Route::MethodNotAllowed(endpoint.allow()),
            None => Route::NotFound,
        }
    }
}

/// Run an endpoint on a fully read request body
///
/// Failures are logged and turned into the error envelope here, so the
/// caller always gets a response.
pub async fn dispatch(
    endpoint: Endpoint,
    content_type: Option<&str>,
    body: Bytes,
    debug: bool,
) -> Response<Full<Bytes>> {
    let result = match endpoint {
        Endpoint::Health => Ok(handlers::health()),
        Endpoint::Buffer => handlers::buffer(body, debug).await,
        Endpoint::Simplify => handlers::simplify(body, debug).await,
        Endpoint::Intersection => handlers::intersection(body).await,
        Endpoint::Analyze => handlers::analyze(body, debug).await,
        Endpoint::Convert => handlers::convert(content_type, body, debug).await,
        Endpoint::Voronoi => handlers::voronoi(body, debug).await,
    };

    result.unwrap_or_else(|e| {
        logger::log_api_failure(endpoint.path(), &e);
        error_response(&e)
    })
}
