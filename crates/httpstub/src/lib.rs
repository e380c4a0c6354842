//! Programmable HTTP stub server for test suites.
//!
//! A test registers expected request/response pairs, exercises the code under
//! test against the server's loopback base URL, and shuts the server down at
//! teardown. Shutdown verifies that every expectation was consumed exactly
//! once and that no unanticipated request arrived.

// ===== Core modules =====
pub mod error;
pub mod expectation;
pub mod matcher;
pub mod request;
pub mod server;

// ===== Peripheral modules =====
pub mod config;

// Re-export the registration API at the crate root
pub use error::StubError;
pub use expectation::{
    Expectation, ExpectationRegistry, Method, RequestDescriptor, RequestDescriptorBuilder,
    ResponseDescriptor, ResponseDescriptorBuilder,
};
pub use request::ReceivedRequest;
pub use server::StubServer;
