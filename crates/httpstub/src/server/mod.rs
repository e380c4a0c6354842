//! The embedded HTTP transport.
//!
//! - `handler` - the hyper-facing dispatcher: one inbound request in, one
//!   response (or fault response) out
//! - `lifecycle` - [`StubServer`]: bind, serve, drain, verify

pub mod handler;
pub mod lifecycle;

pub use handler::UNEXPECTED_MARKER_HEADER;
pub use lifecycle::StubServer;
