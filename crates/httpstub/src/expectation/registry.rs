//! Ordered expectation store with at-most-once consumption.

use crate::error::StubError;
use crate::expectation::{RequestDescriptor, ResponseDescriptor};
use crate::matcher::is_match;
use crate::request::ReceivedRequest;
use parking_lot::Mutex;

/// One registered (request descriptor, response descriptor) pair.
///
/// Identity is positional: two expectations with identical descriptors are
/// distinct entries and are consumed independently, in registration order.
#[derive(Debug, Clone)]
pub struct Expectation {
    request: RequestDescriptor,
    response: ResponseDescriptor,
}

impl Expectation {
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn response(&self) -> &ResponseDescriptor {
        &self.response
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Insertion order = registration order. An entry is removed the instant
    /// it is consumed.
    pending: Vec<Expectation>,
    /// Audit history of served expectations, in consumption order.
    consumed: Vec<Expectation>,
    /// `path?query` of the most recent unmatched inbound request. Overwritten
    /// by each subsequent unmatched request; only the latest is retained.
    last_unexpected: Option<String>,
    /// Total inbound requests dispatched, matched or not.
    request_count: u64,
}

/// The one piece of shared mutable state in the stub server.
///
/// All mutations go through a single mutex so two concurrent requests can
/// never consume the same pending expectation. The verification checks are
/// read-only and idempotent, but their verdict is only meaningful once the
/// transport has drained in-flight requests; that ordering is the caller's
/// contract, not enforced here.
#[derive(Debug, Default)]
pub struct ExpectationRegistry {
    state: Mutex<RegistryState>,
}

impl ExpectationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expectation. Always succeeds; safe to call while traffic is
    /// in flight.
    pub fn add_expectation(&self, request: RequestDescriptor, response: ResponseDescriptor) {
        let mut state = self.state.lock();
        state.pending.push(Expectation { request, response });
    }

    /// Pair an inbound request with the first pending expectation that
    /// matches, in registration order, and consume it.
    ///
    /// First match wins, not best match: registering the same path twice with
    /// different responses yields sequential replay. A request that matches
    /// nothing records its `path?query` for later verification and returns
    /// [`StubError::UnexpectedRequest`]; the server keeps serving.
    pub fn consume(&self, request: &ReceivedRequest) -> Result<ResponseDescriptor, StubError> {
        let mut state = self.state.lock();
        state.request_count += 1;

        match state
            .pending
            .iter()
            .position(|expectation| is_match(request, &expectation.request))
        {
            Some(index) => {
                let expectation = state.pending.remove(index);
                let response = expectation.response.clone();
                state.consumed.push(expectation);
                Ok(response)
            }
            None => {
                let rendered = request.path_and_query();
                state.last_unexpected = Some(rendered.clone());
                Err(StubError::UnexpectedRequest(rendered))
            }
        }
    }

    /// Fail if any inbound request matched no pending expectation.
    ///
    /// The error text carries the same `path?query` rendering the dispatch
    /// fault reported. Read-only and idempotent.
    pub fn check_no_unexpected_requests(&self) -> Result<(), StubError> {
        let state = self.state.lock();
        match &state.last_unexpected {
            Some(rendered) => Err(StubError::UnexpectedRequest(rendered.clone())),
            None => Ok(()),
        }
    }

    /// Fail if any registered expectation was never consumed. Read-only and
    /// idempotent.
    pub fn check_all_expectations_met(&self) -> Result<(), StubError> {
        let state = self.state.lock();
        match state.pending.first() {
            Some(first) => Err(StubError::UnmatchedExpectations {
                count: state.pending.len(),
                first: first.request.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Number of expectations still awaiting consumption.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Served expectations, in consumption order.
    pub fn consumed(&self) -> Vec<Expectation> {
        self.state.lock().consumed.clone()
    }

    /// Total inbound requests dispatched, matched or not.
    pub fn request_count(&self) -> u64 {
        self.state.lock().request_count
    }
}
