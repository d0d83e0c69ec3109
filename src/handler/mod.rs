//! Request handler module
//!
//! Per-request processing in front of the API: preflight, routing, body
//! limits and access logging.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
