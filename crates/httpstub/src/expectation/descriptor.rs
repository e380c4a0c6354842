//! Immutable request and response descriptors.
//!
//! Descriptors are built through consuming builders and are frozen once
//! handed to the registry. Pattern compilation happens in the builder
//! methods that accept patterns; `build()` surfaces the first compile error.

use crate::matcher::{BodyMatch, HeaderMatch, ValueMatch};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// HTTP methods an expectation can constrain on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a method name outside the supported set.
#[derive(Debug, thiserror::Error)]
#[error("unsupported method: {0}")]
pub struct InvalidMethod(pub String);

impl FromStr for Method {
    type Err = InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(InvalidMethod(other.to_string())),
        }
    }
}

/// Immutable specification of an expected request.
///
/// Facets left unspecified are wildcards; see
/// [`is_match`](crate::matcher::is_match) for the matching rule.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Option<Method>,
    path: ValueMatch,
    query: Vec<(String, ValueMatch)>,
    headers: Vec<(String, HeaderMatch)>,
    body: Option<BodyMatch>,
    content_type: Option<ValueMatch>,
}

impl RequestDescriptor {
    /// Expect a `GET` to the exact `path`.
    pub fn get(path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(Some(Method::Get), path.into())
    }

    /// Expect a `POST` to the exact `path`.
    pub fn post(path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(Some(Method::Post), path.into())
    }

    /// Expect a `PUT` to the exact `path`.
    pub fn put(path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(Some(Method::Put), path.into())
    }

    /// Expect a `DELETE` to the exact `path`.
    pub fn delete(path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(Some(Method::Delete), path.into())
    }

    /// Expect any method on the exact `path`.
    pub fn any(path: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(None, path.into())
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn path(&self) -> &ValueMatch {
        &self.path
    }

    pub fn query(&self) -> &[(String, ValueMatch)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, HeaderMatch)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&BodyMatch> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&ValueMatch> {
        self.content_type.as_ref()
    }
}

impl fmt::Display for RequestDescriptor {
    /// Renders as `<method> <path>`, with `*` for an unconstrained method.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.method.map(|m| m.as_str()).unwrap_or("*");
        let path = match &self.path {
            ValueMatch::Exact(path) => path.as_str(),
            ValueMatch::Pattern(pattern) => pattern.source(),
        };
        write!(f, "{method} {path}")
    }
}

/// Consuming builder for [`RequestDescriptor`].
///
/// Created via the method constructors on [`RequestDescriptor`]. Methods that
/// accept a pattern compile it eagerly; the first compile failure is reported
/// by [`build`](Self::build).
#[derive(Debug)]
pub struct RequestDescriptorBuilder {
    method: Option<Method>,
    path: ValueMatch,
    query: Vec<(String, ValueMatch)>,
    headers: Vec<(String, HeaderMatch)>,
    body: Option<BodyMatch>,
    content_type: Option<ValueMatch>,
    error: Option<regex::Error>,
}

impl RequestDescriptorBuilder {
    fn new(method: Option<Method>, path: String) -> Self {
        Self {
            method,
            path: ValueMatch::exact(path),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            content_type: None,
            error: None,
        }
    }

    fn compile(&mut self, source: &str) -> Option<ValueMatch> {
        match ValueMatch::pattern(source) {
            Ok(matcher) => Some(matcher),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }

    /// Replace the exact path with an anchored regex over the whole path.
    pub fn path_pattern(mut self, source: &str) -> Self {
        if let Some(matcher) = self.compile(source) {
            self.path = matcher;
        }
        self
    }

    /// Require query parameter `name` to equal `value` exactly.
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), ValueMatch::exact(value)));
        self
    }

    /// Require query parameter `name` to fully match the pattern.
    pub fn query_param_pattern(mut self, name: impl Into<String>, source: &str) -> Self {
        if let Some(matcher) = self.compile(source) {
            self.query.push((name.into(), matcher));
        }
        self
    }

    /// Require header `name` to equal `value` exactly.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.into(), HeaderMatch::Value(ValueMatch::exact(value))));
        self
    }

    /// Require header `name` to fully match the pattern.
    pub fn header_pattern(mut self, name: impl Into<String>, source: &str) -> Self {
        if let Some(matcher) = self.compile(source) {
            self.headers.push((name.into(), HeaderMatch::Value(matcher)));
        }
        self
    }

    /// Fail the match if header `name` is present on the request.
    pub fn header_absent(mut self, name: impl Into<String>) -> Self {
        self.headers.push((name.into(), HeaderMatch::Absent));
        self
    }

    /// Require the decoded body to equal `body` exactly.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(BodyMatch::Exact(body.into()));
        self
    }

    /// Require the decoded body to fully match the pattern.
    pub fn body_pattern(mut self, source: &str) -> Self {
        if let Some(ValueMatch::Pattern(pattern)) = self.compile(source) {
            self.body = Some(BodyMatch::Pattern(pattern));
        }
        self
    }

    /// Require the body to parse as JSON structurally equal to `value`.
    pub fn body_json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(BodyMatch::Json(value));
        self
    }

    /// Require the decoded body to satisfy an arbitrary predicate.
    pub fn body_matches<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.body = Some(BodyMatch::Predicate(Arc::new(predicate)));
        self
    }

    /// Require the request's media type (parameters stripped) to equal
    /// `content_type` exactly.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(ValueMatch::exact(content_type));
        self
    }

    /// Require the request's media type to fully match the pattern.
    pub fn content_type_pattern(mut self, source: &str) -> Self {
        if let Some(matcher) = self.compile(source) {
            self.content_type = Some(matcher);
        }
        self
    }

    /// Freeze the descriptor, reporting the first pattern that failed to
    /// compile.
    pub fn build(self) -> Result<RequestDescriptor, regex::Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(RequestDescriptor {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: self.body,
            content_type: self.content_type,
        })
    }
}

/// Immutable specification of the response to serve for one expectation.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    status: u16,
    content_type: String,
    body: String,
    headers: Vec<(String, String)>,
}

impl ResponseDescriptor {
    /// A `200 OK` response.
    pub fn ok() -> ResponseDescriptorBuilder {
        Self::status(200)
    }

    /// A response with the given status code.
    pub fn status(status: u16) -> ResponseDescriptorBuilder {
        ResponseDescriptorBuilder {
            status,
            content_type: None,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Custom headers in registration order. Names are unique.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// Consuming builder for [`ResponseDescriptor`]. Infallible.
#[derive(Debug)]
pub struct ResponseDescriptorBuilder {
    status: u16,
    content_type: Option<String>,
    body: Option<String>,
    headers: Vec<(String, String)>,
}

impl ResponseDescriptorBuilder {
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set header `name`, replacing any earlier value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn build(self) -> ResponseDescriptor {
        ResponseDescriptor {
            status: self.status,
            content_type: self.content_type.unwrap_or_else(|| "text/plain".to_string()),
            body: self.body.unwrap_or_default(),
            headers: self.headers,
        }
    }
}
