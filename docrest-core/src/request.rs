//! HTTP-style request and response values.
//!
//! These are transport-neutral: a serverless adapter or web framework fills an
//! [`HttpRequest`] from its own request type and writes the [`HttpResponse`]
//! back out.

use std::collections::HashMap;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde_json::Value;

/// An inbound request against one collection.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: Method,
    pub headers: HeaderMap,
    /// Decoded query-string parameters.
    pub query: HashMap<String, String>,
    /// Path parameters, e.g. `id`.
    pub params: HashMap<String, String>,
    /// Parsed JSON body, if any.
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn builder(method: Method) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method)
    }

    /// Returns a header value as text. Header names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Returns a non-empty path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }
}

pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    pub fn new(method: Method) -> Self {
        HttpRequestBuilder { request: HttpRequest { method, ..HttpRequest::default() } }
    }

    /// Adds a header. Names or values that are not valid HTTP are skipped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) =
            (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
        {
            self.request.headers.insert(name, value);
        }
        self
    }

    /// Shorthand for a `content-type: application/json` header.
    pub fn json_content(self) -> Self {
        self.header("content-type", "application/json")
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.params.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.request.body = Some(body);
        self
    }

    pub fn build(self) -> HttpRequest {
        self.request
    }
}

/// The outcome of a request: a status plus an optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl HttpResponse {
    /// A response with no body.
    pub fn empty(status: StatusCode) -> Self {
        HttpResponse { status, body: None }
    }

    pub fn json(status: StatusCode, body: Value) -> Self {
        HttpResponse { status, body: Some(body) }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
