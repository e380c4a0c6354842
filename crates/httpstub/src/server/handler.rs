//! The hyper-facing dispatcher.

use crate::expectation::{ExpectationRegistry, ResponseDescriptor};
use crate::request::ReceivedRequest;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker header carried only by dispatch-fault responses, so a test's HTTP
/// client can tell an unexpected-request failure apart from a deliberately
/// configured non-2xx response (which never carries it).
pub const UNEXPECTED_MARKER_HEADER: &str = "x-stub-unexpected";

/// Dispatch one inbound request against the registry.
///
/// The body is collected off the transport exactly once, here, before
/// matching. A request that consumes an expectation is answered with its
/// response descriptor; a request that matches nothing is answered with a
/// `500` fault response and remembered for teardown verification.
pub async fn handle_request(
    req: Request<Incoming>,
    registry: Arc<ExpectationRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let uri = req.uri().clone();
    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();

    let body_bytes = match req.into_body().collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            if bytes.is_empty() {
                None
            } else {
                Some(bytes)
            }
        }
        Err(_) => None,
    };

    debug!("received {} {}", method, uri);

    let received = ReceivedRequest::new(
        method,
        uri.path(),
        uri.query(),
        headers,
        body_bytes.as_deref(),
    );

    match registry.consume(&received) {
        Ok(descriptor) => Ok(write_response(&descriptor)),
        Err(fault) => {
            warn!("{fault}");
            Ok(fault_response(&fault.to_string()))
        }
    }
}

/// Render a response descriptor onto the transport: status first, then the
/// content type, then every custom header, and only then the body. All
/// headers are finalized on the builder before the body is attached.
fn write_response(descriptor: &ResponseDescriptor) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(descriptor.status_code())
        .header(CONTENT_TYPE, descriptor.content_type());
    for (name, value) in descriptor.headers() {
        builder = builder.header(name, value);
    }
    builder
        .body(Full::new(Bytes::from(descriptor.body().to_string())))
        .unwrap_or_else(|err| {
            // Only reachable with an unrenderable registered descriptor
            // (e.g. an invalid header name).
            warn!("failed to render response descriptor: {err}");
            fault_response(&format!("unrenderable response descriptor: {err}"))
        })
}

fn fault_response(message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(CONTENT_TYPE, "text/plain")
        .header(UNEXPECTED_MARKER_HEADER, "true")
        .body(Full::new(Bytes::from(message.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_writes_status_content_type_and_custom_headers() {
        let descriptor = ResponseDescriptor::status(409)
            .content_type("application/json")
            .header("X-foo", "barrr")
            .body(r#"{"ok":false}"#)
            .build();

        let response = write_response(&descriptor);
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(response.headers().get("X-foo").unwrap(), "barrr");
        assert!(response.headers().get(UNEXPECTED_MARKER_HEADER).is_none());
    }

    #[test]
    fn fault_response_carries_the_marker_header() {
        let response = fault_response("unexpected request: /yarr?gooo=gredge");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(UNEXPECTED_MARKER_HEADER).unwrap(),
            "true"
        );
    }
}
