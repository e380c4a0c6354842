//! Transport-independent view of one inbound request.
//!
//! The dispatcher builds a [`ReceivedRequest`] from the raw hyper request
//! (collecting the body exactly once) and hands it to the registry; the
//! matcher only ever sees this type, never the transport.

use std::collections::HashMap;

/// One inbound HTTP request, with its body already read off the transport
/// and decoded.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    method: String,
    path: String,
    query: Option<String>,
    /// Header names lowercased; multi-valued headers collapse to the last
    /// value seen.
    headers: HashMap<String, String>,
    /// Decoded body text. `None` when the body could not be decoded with the
    /// declared charset.
    body: Option<String>,
    had_body: bool,
}

impl ReceivedRequest {
    /// Build a request view from its transport-level parts. `body` is the
    /// raw body bytes, already fully read; decoding honours the charset
    /// declared in `Content-Type` (UTF-8 when unspecified).
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        query: Option<&str>,
        headers: HashMap<String, String>,
        body: Option<&[u8]>,
    ) -> Self {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        let charset = headers
            .get("content-type")
            .and_then(|value| charset_of(value))
            .map(str::to_ascii_lowercase);
        let decoded = body.and_then(|bytes| decode_body(bytes, charset.as_deref()));

        Self {
            method: method.into(),
            path: path.into(),
            query: query.map(str::to_string),
            headers,
            body: decoded,
            had_body: body.is_some(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Query parameters, percent-decoded. Later duplicates of a name win.
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query
            .as_deref()
            .map_or_else(HashMap::new, parse_query_string)
    }

    /// The `Content-Type` media type with any parameters (e.g. `charset`)
    /// stripped.
    pub fn media_type(&self) -> Option<&str> {
        self.header("content-type")
            .map(|value| value.split(';').next().unwrap_or(value).trim())
    }

    /// The body text a body matcher should run against: the decoded body, an
    /// empty string when the request carried no body at all, or `None` when
    /// the body was present but undecodable (treated as non-matching).
    pub fn matchable_body(&self) -> Option<&str> {
        match (&self.body, self.had_body) {
            (Some(text), _) => Some(text),
            (None, false) => Some(""),
            (None, true) => None,
        }
    }

    /// Path plus query string, rendered the way it appeared on the request
    /// line (e.g. `/yarr?gooo=gredge`).
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// Parse a query string into a map, percent-decoding names and values.
pub fn parse_query_string(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        if let Some((name, value)) = pair.split_once('=') {
            params.insert(
                urlencoding::decode(name).unwrap_or_default().to_string(),
                urlencoding::decode(value).unwrap_or_default().to_string(),
            );
        } else if !pair.is_empty() {
            params.insert(
                urlencoding::decode(pair).unwrap_or_default().to_string(),
                String::new(),
            );
        }
    }
    params
}

/// Extract the `charset` parameter from a `Content-Type` value.
fn charset_of(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Decode body bytes per the declared charset. UTF-8 is the default and the
/// fallback for unknown charsets; a body that does not decode yields `None`.
fn decode_body(bytes: &[u8], charset: Option<&str>) -> Option<String> {
    match charset {
        Some("iso-8859-1") | Some("latin1") | Some("latin-1") => {
            Some(bytes.iter().map(|&b| b as char).collect())
        }
        _ => String::from_utf8(bytes.to_vec()).ok(),
    }
}
