//! Error types surfaced to the test author.

use std::net::SocketAddr;

/// Errors raised by dispatch, teardown verification, and server setup.
///
/// Dispatch-time mismatches against a single descriptor are a normal `false`
/// from the matcher and never produce an error; only the absence of any match
/// escalates to [`StubError::UnexpectedRequest`].
#[derive(Debug, thiserror::Error)]
pub enum StubError {
    /// An inbound request matched no pending expectation. Carries the
    /// request's path plus query string, rendered exactly as received.
    /// Raised at dispatch time and again, deferred, by
    /// [`check_no_unexpected_requests`](crate::ExpectationRegistry::check_no_unexpected_requests)
    /// with the same text.
    #[error("unexpected request: {0}")]
    UnexpectedRequest(String),

    /// One or more registered expectations were never consumed.
    #[error("{count} unmatched expectation(s), first unmet: {first}")]
    UnmatchedExpectations {
        /// Number of expectations still pending.
        count: usize,
        /// Rendering (method + path) of the earliest-registered pending
        /// expectation.
        first: String,
    },

    /// The listener failed to bind. Fatal, never retried.
    #[error("failed to bind stub listener on {addr}: {source}")]
    Setup {
        addr: SocketAddr,
        source: std::io::Error,
    },
}
