//! The conjunction of a descriptor's facets over one inbound request.

use crate::expectation::RequestDescriptor;
use crate::matcher::HeaderMatch;
use crate::request::ReceivedRequest;

/// Decide whether `request` satisfies every facet `descriptor` specifies.
///
/// Pure and side-effect-free. Facets the descriptor leaves unspecified are
/// wildcards; a request facet the descriptor names but the request lacks (or
/// carries malformed, e.g. an undecodable body) is a mismatch, never an error.
pub fn is_match(request: &ReceivedRequest, descriptor: &RequestDescriptor) -> bool {
    if let Some(method) = descriptor.method() {
        if request.method() != method.as_str() {
            return false;
        }
    }

    if !descriptor.path().matches(request.path()) {
        return false;
    }

    // Every named parameter must be present and match; extras on the request
    // are ignored.
    let params = request.query_params();
    for (name, matcher) in descriptor.query() {
        match params.get(name) {
            Some(value) if matcher.matches(value) => {}
            _ => return false,
        }
    }

    for (name, matcher) in descriptor.headers() {
        match matcher {
            HeaderMatch::Absent => {
                if request.header(name).is_some() {
                    return false;
                }
            }
            HeaderMatch::Value(value_match) => match request.header(name) {
                Some(value) if value_match.matches(value) => {}
                _ => return false,
            },
        }
    }

    if let Some(content_type) = descriptor.content_type() {
        match request.media_type() {
            Some(media_type) if content_type.matches(media_type) => {}
            _ => return false,
        }
    }

    if let Some(body_match) = descriptor.body() {
        match request.matchable_body() {
            Some(body) if body_match.matches(body) => {}
            _ => return false,
        }
    }

    true
}
