//! Error taxonomy for API requests
//!
//! Every failure raised while handling a request is one of these kinds. The
//! `Display` text is what the caller sees; library-internal detail carried by
//! `Projection` and `Io` stays in the error log.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingInput(&'static str),

    #[error("No file provided")]
    NoFileProvided,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported input file: {0}")]
    UnsupportedInput(String),

    #[error("invalid multipart upload: {0}")]
    InvalidUpload(String),

    #[error("voronoi tessellation requires at least 3 non-collinear points")]
    InsufficientPoints,

    #[error("coordinate reprojection failed")]
    Projection(String),

    #[error("internal server error")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Detail that must not reach the caller, if any
    pub fn internal_detail(&self) -> Option<String> {
        match self {
            Self::Projection(detail) => Some(detail.clone()),
            Self::Io(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidJson(e.to_string())
    }
}

impl From<geojson::Error> for ApiError {
    fn from(e: geojson::Error) -> Self {
        Self::InvalidGeometry(e.to_string())
    }
}

impl From<proj::ProjError> for ApiError {
    fn from(e: proj::ProjError) -> Self {
        Self::Projection(e.to_string())
    }
}

impl From<proj::ProjCreateError> for ApiError {
    fn from(e: proj::ProjCreateError) -> Self {
        Self::Projection(e.to_string())
    }
}

impl From<multer::Error> for ApiError {
    fn from(e: multer::Error) -> Self {
        Self::InvalidUpload(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
