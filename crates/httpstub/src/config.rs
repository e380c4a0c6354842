//! File-driven expectation registration.
//!
//! The `httpstub` binary reads a YAML or JSON file of expectations and
//! registers them against a fresh server. The file format mirrors the
//! builder API:
//!
//! ```yaml
//! expectations:
//!   - request:
//!       method: GET
//!       path: /users/1
//!     response:
//!       status: 200
//!       content_type: application/json
//!       body: '{"id": 1}'
//!       headers:
//!         x-request-id: abc
//! ```

use crate::expectation::{Method, RequestDescriptor, ResponseDescriptor};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level expectation file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StubConfig {
    #[serde(default)]
    pub expectations: Vec<ExpectationConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExpectationConfig {
    pub request: RequestConfig,
    #[serde(default)]
    pub response: ResponseConfig,
}

/// Request side of one file expectation. Exactly one of `path` /
/// `path_pattern` must be set; `body`, `body_pattern` and `body_json` are
/// mutually exclusive.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers_absent: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_json: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResponseConfig {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

fn default_status() -> u16 {
    200
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            status: default_status(),
            content_type: None,
            body: None,
            headers: BTreeMap::new(),
        }
    }
}

impl StubConfig {
    /// Load from a `.json` file (serde_json) or anything else (serde_yaml).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: StubConfig = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)
                .with_context(|| format!("invalid JSON in {}", path.display()))?
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("invalid YAML in {}", path.display()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate mutual exclusions the type system cannot express.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (index, expectation) in self.expectations.iter().enumerate() {
            let request = &expectation.request;
            match (&request.path, &request.path_pattern) {
                (None, None) => {
                    anyhow::bail!("expectation #{index}: one of 'path' or 'path_pattern' is required")
                }
                (Some(_), Some(_)) => {
                    anyhow::bail!("expectation #{index}: 'path' and 'path_pattern' are exclusive")
                }
                _ => {}
            }
            let body_forms = [
                request.body.is_some(),
                request.body_pattern.is_some(),
                request.body_json.is_some(),
            ];
            if body_forms.iter().filter(|set| **set).count() > 1 {
                anyhow::bail!(
                    "expectation #{index}: 'body', 'body_pattern' and 'body_json' are exclusive"
                );
            }
        }
        Ok(())
    }

    /// Convert every file expectation into descriptor pairs, ready for
    /// registration.
    pub fn to_expectations(
        &self,
    ) -> Result<Vec<(RequestDescriptor, ResponseDescriptor)>, anyhow::Error> {
        self.expectations
            .iter()
            .enumerate()
            .map(|(index, expectation)| {
                expectation
                    .to_descriptors()
                    .with_context(|| format!("expectation #{index}"))
            })
            .collect()
    }
}

impl ExpectationConfig {
    fn to_descriptors(&self) -> Result<(RequestDescriptor, ResponseDescriptor), anyhow::Error> {
        let request = &self.request;

        let path = request.path.clone().unwrap_or_default();
        let mut builder = match &request.method {
            Some(name) => {
                let method: Method = name.parse()?;
                match method {
                    Method::Get => RequestDescriptor::get(path),
                    Method::Post => RequestDescriptor::post(path),
                    Method::Put => RequestDescriptor::put(path),
                    Method::Delete => RequestDescriptor::delete(path),
                }
            }
            None => RequestDescriptor::any(path),
        };

        if let Some(pattern) = &request.path_pattern {
            builder = builder.path_pattern(pattern);
        }
        for (name, value) in &request.query {
            builder = builder.query_param(name, value);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        for name in &request.headers_absent {
            builder = builder.header_absent(name);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body);
        }
        if let Some(pattern) = &request.body_pattern {
            builder = builder.body_pattern(pattern);
        }
        if let Some(value) = &request.body_json {
            builder = builder.body_json(value.clone());
        }
        if let Some(content_type) = &request.content_type {
            builder = builder.content_type(content_type);
        }
        let request_descriptor = builder.build().context("invalid pattern")?;

        let response = &self.response;
        let mut builder = ResponseDescriptor::status(response.status);
        if let Some(content_type) = &response.content_type {
            builder = builder.content_type(content_type);
        }
        if let Some(body) = &response.body {
            builder = builder.body(body);
        }
        for (name, value) in &response.headers {
            builder = builder.header(name, value);
        }

        Ok((request_descriptor, builder.build()))
    }
}
