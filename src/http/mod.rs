//! HTTP protocol layer module
//!
//! Protocol-level helpers decoupled from the geometry endpoints: response
//! builders, CORS headers and size-capped body reading.

pub mod body;
pub mod response;

// Re-export commonly used types
pub use body::{declared_length_exceeds, read_limited, BodyError};
pub use response::{
    apply_common_headers, build_404_response, build_405_response, build_413_response,
    build_json_response, build_options_response,
};
