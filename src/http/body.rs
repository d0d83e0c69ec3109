//! Request body reading with a size cap

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::HeaderMap;

#[derive(Debug)]
pub enum BodyError {
    TooLarge,
    Read(String),
}

/// Check the declared Content-Length against the cap.
///
/// A missing or malformed header is not rejected here; `read_limited` still
/// enforces the cap while reading.
pub fn declared_length_exceeds(headers: &HeaderMap, max_body_size: u64) -> bool {
    let Some(content_length) = headers.get("content-length") else {
        return false;
    };
    match content_length.to_str().map(str::parse::<u64>) {
        Ok(Ok(size)) => size > max_body_size,
        Ok(Err(_)) | Err(_) => {
            crate::logger::log_warning("Invalid Content-Length header, checking while reading");
            false
        }
    }
}

/// Collect the whole body, failing with `TooLarge` past `max_body_size` bytes
pub async fn read_limited<B>(body: B, max_body_size: u64) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(BodyError::TooLarge),
        Err(e) => Err(BodyError::Read(e.to_string())),
    }
}
